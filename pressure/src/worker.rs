use std::{fmt, sync::Arc};

use key_value::{KeyGenerator, Payload};
use log::{debug, info, warn};
use rand::rngs::StdRng;

use crate::{
    error::PressureError,
    monitor::{self, MemoryCeiling},
    signal::StopSignal,
    store::Store,
};

/// Key every read-mode worker GETs.
pub const READ_KEY: &str = "test";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Get,
    Set,
    /// Kept verbatim; a worker rejects it on its first operation.
    Unrecognized(String),
}

impl From<&str> for Mode {
    fn from(value: &str) -> Self {
        match value {
            "get" => Mode::Get,
            "set" => Mode::Set,
            other => Mode::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Get => f.write_str("get"),
            Mode::Set => f.write_str("set"),
            Mode::Unrecognized(mode) => f.write_str(mode),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    CheckMemory,
    Operate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Memory reached the ceiling.
    Stopped,
    /// The run-wide stop signal tripped.
    Canceled,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerTally {
    pub memory_checks: u64,
    pub gets: u64,
    pub get_misses: u64,
    pub sets: u64,
}

impl WorkerTally {
    pub fn merge(&mut self, other: &WorkerTally) {
        self.memory_checks += other.memory_checks;
        self.gets += other.gets;
        self.get_misses += other.get_misses;
        self.sets += other.sets;
    }

    pub fn operations(&self) -> u64 {
        self.gets + self.sets
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    pub exit: WorkerExit,
    pub tally: WorkerTally,
}

/// Everything the workers of one run share read-only.
pub struct WorkerContext {
    pub store: Arc<dyn Store>,
    pub signal: Arc<StopSignal>,
    pub mode: Mode,
    pub ceiling: MemoryCeiling,
    pub payload: Payload,
}

pub struct Worker {
    id: usize,
    context: Arc<WorkerContext>,
    keys: KeyGenerator<StdRng>,
    state: WorkerState,
    tally: WorkerTally,
}

impl Worker {
    pub fn new(id: usize, context: Arc<WorkerContext>, keys: KeyGenerator<StdRng>) -> Self {
        Self {
            id,
            context,
            keys,
            state: WorkerState::CheckMemory,
            tally: WorkerTally::default(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn tally(&self) -> WorkerTally {
        self.tally
    }

    /// Performs one transition. `Ok(None)` means the worker should keep going.
    pub async fn step(&mut self) -> Result<Option<WorkerExit>, PressureError> {
        if self.context.signal.is_tripped() {
            return Ok(Some(WorkerExit::Canceled));
        }

        match self.state {
            WorkerState::CheckMemory => self.check_memory().await,
            WorkerState::Operate => self.operate().await,
        }
    }

    /// Steps until a terminal state.
    ///
    /// A failure trips the stop signal; only the worker that trips it reports
    /// its error, so a run surfaces at most one.
    pub async fn run(mut self) -> Result<WorkerReport, PressureError> {
        loop {
            match self.step().await {
                Ok(None) => continue,
                Ok(Some(exit)) => return Ok(self.report(exit)),
                Err(error) => {
                    if self.context.signal.trip() {
                        warn!("worker {}: failed, stopping all workers: {}", self.id, error);
                        return Err(error);
                    }
                    debug!("worker {}: failed after stop was requested: {}", self.id, error);
                    return Ok(self.report(WorkerExit::Canceled));
                }
            }
        }
    }

    fn report(&self, exit: WorkerExit) -> WorkerReport {
        WorkerReport {
            id: self.id,
            exit,
            tally: self.tally,
        }
    }

    async fn check_memory(&mut self) -> Result<Option<WorkerExit>, PressureError> {
        let context = &self.context;
        let Some(reading) = context
            .signal
            .guard(monitor::used_memory(context.store.as_ref()))
            .await
        else {
            return Ok(Some(WorkerExit::Canceled));
        };
        let used = reading?;
        self.tally.memory_checks += 1;

        if self.context.ceiling.reached(used) {
            debug!(
                "worker {}: used memory {} bytes reached ceiling {}",
                self.id, used, self.context.ceiling
            );
            return Ok(Some(WorkerExit::Stopped));
        }

        self.state = WorkerState::Operate;
        Ok(None)
    }

    async fn operate(&mut self) -> Result<Option<WorkerExit>, PressureError> {
        let context = Arc::clone(&self.context);

        match &context.mode {
            Mode::Get => {
                info!("worker {}: getting data...", self.id);
                let Some(reply) = context.signal.guard(context.store.get(READ_KEY)).await else {
                    return Ok(Some(WorkerExit::Canceled));
                };
                // a missing key is the expected steady state
                if reply?.is_none() {
                    self.tally.get_misses += 1;
                }
                self.tally.gets += 1;
            }
            Mode::Set => {
                let pair = self.keys.next_pair(&context.payload);
                info!("worker {}: inserting data...", self.id);
                let Some(reply) = context
                    .signal
                    .guard(context.store.set(&pair.key, pair.value.as_str()))
                    .await
                else {
                    return Ok(Some(WorkerExit::Canceled));
                };
                reply?;
                self.tally.sets += 1;
            }
            Mode::Unrecognized(mode) => {
                return Err(PressureError::UnrecognizedMode(mode.clone()));
            }
        }

        self.state = WorkerState::CheckMemory;
        Ok(None)
    }
}
