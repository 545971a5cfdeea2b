pub mod coordinator;
pub mod error;
pub mod monitor;
pub mod signal;
pub mod store;
pub mod worker;

#[cfg(test)]
mod testing;

pub use coordinator::{Coordinator, RunConfig, RunReport};
pub use error::{PressureError, StoreError};
pub use monitor::{MemoryCeiling, parse_used_memory, used_memory};
pub use signal::StopSignal;
pub use store::{RedisStore, Store, StoreAddress};
pub use worker::{Mode, WorkerExit, WorkerTally};
