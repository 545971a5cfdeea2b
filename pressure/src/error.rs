use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),
}

#[derive(Debug, Error)]
pub enum PressureError {
    #[error("Unrecognized mode {0}, exiting")]
    UnrecognizedMode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Memory parse error: {0}")]
    Parse(String),

    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Interrupted before max memory was reached")]
    Interrupted,
}

impl PressureError {
    /// Configuration problems, as opposed to anything the store did.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            PressureError::UnrecognizedMode(_) | PressureError::InvalidConfig(_)
        )
    }
}
