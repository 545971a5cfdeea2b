use std::{
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

/// Run-wide cancellation flag; the first `trip` wins, later ones are no-ops.
#[derive(Debug, Default)]
pub struct StopSignal {
    tripped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true only for the caller that actually tripped the signal.
    pub fn trip(&self) -> bool {
        let first = !self.tripped.swap(true, Ordering::AcqRel);
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Resolves once the signal has tripped, including before this call.
    pub async fn tripped(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // register before the flag check so a concurrent trip cannot be missed
        notified.as_mut().enable();

        if self.is_tripped() {
            return;
        }
        notified.await;
    }

    /// Drives `operation` unless the signal trips first; `None` means canceled.
    pub async fn guard<F: Future>(&self, operation: F) -> Option<F::Output> {
        if self.is_tripped() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.tripped() => None,
            output = operation => Some(output),
        }
    }
}
