use std::{fmt, sync::Arc};

use key_value::{KeyGenerator, Payload};
use log::{debug, error, info};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::task::JoinSet;

use crate::{
    error::PressureError,
    monitor::MemoryCeiling,
    signal::StopSignal,
    store::{Store, StoreAddress},
    worker::{Mode, Worker, WorkerContext, WorkerExit, WorkerTally},
};

/// Immutable description of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub address: StoreAddress,
    pub mode: Mode,
    pub workers: usize,
    /// Generated value length, set mode only.
    pub length: usize,
    pub ceiling: MemoryCeiling,
    pub prefix: String,
    /// Fixes the payload and every key; OS entropy when absent.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            address: StoreAddress::default(),
            mode: Mode::Get,
            workers: 100,
            length: 50_000,
            ceiling: MemoryCeiling::UNLIMITED,
            prefix: String::new(),
            seed: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), PressureError> {
        if self.workers == 0 {
            return Err(PressureError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub ceiling: MemoryCeiling,
    pub workers: usize,
    /// Workers that saw the ceiling themselves, the rest were canceled.
    pub stopped: usize,
    pub tally: WorkerTally,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "max memory {} Mo reached, exiting", self.ceiling.megabytes())
    }
}

pub struct Coordinator {
    store: Arc<dyn Store>,
    config: RunConfig,
    signal: Arc<StopSignal>,
}

impl Coordinator {
    pub fn new(store: Arc<dyn Store>, config: RunConfig) -> Self {
        Self {
            store,
            config,
            signal: Arc::new(StopSignal::new()),
        }
    }

    /// Handle to the run's stop signal; tripping it from outside interrupts the run.
    pub fn signal(&self) -> Arc<StopSignal> {
        Arc::clone(&self.signal)
    }

    /// Runs every worker to completion and folds their outcomes into one.
    pub async fn run(self) -> Result<RunReport, PressureError> {
        self.config.validate()?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let payload = match self.config.mode {
            Mode::Set => Payload::generate(self.config.length, &mut rng),
            _ => Payload::default(),
        };
        let context = Arc::new(WorkerContext {
            store: self.store,
            signal: Arc::clone(&self.signal),
            mode: self.config.mode.clone(),
            ceiling: self.config.ceiling,
            payload,
        });

        info!(
            "Starting {} workers in {} mode, ceiling {}",
            self.config.workers, self.config.mode, self.config.ceiling
        );
        let mut workers = JoinSet::new();
        for id in 1..=self.config.workers {
            let keys = KeyGenerator::new(
                self.config.prefix.clone(),
                StdRng::seed_from_u64(rng.random()),
            );
            let worker = Worker::new(id, Arc::clone(&context), keys);
            workers.spawn(worker.run());
        }

        let mut failure = None;
        let mut tally = WorkerTally::default();
        let mut stopped = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(report)) => {
                    debug!("worker {}: exited {:?}", report.id, report.exit);
                    tally.merge(&report.tally);
                    if report.exit == WorkerExit::Stopped {
                        stopped += 1;
                    }
                }
                Ok(Err(e)) => {
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
                Err(join_error) => {
                    let e = PressureError::WorkerPanicked(join_error.to_string());
                    if context.signal.trip() {
                        error!("{}", e);
                        failure = Some(e);
                    }
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }
        // tripped without any worker failing: someone outside stopped the run,
        // unless every worker had already seen the ceiling
        if context.signal.is_tripped() && stopped < self.config.workers {
            return Err(PressureError::Interrupted);
        }

        Ok(RunReport {
            ceiling: self.config.ceiling,
            workers: self.config.workers,
            stopped,
            tally,
        })
    }
}
