//! Cancellation for in-flight downloads.
//!
//! A `CancelToken` is a shared abort flag. The fetcher checks it from the curl
//! write/progress callbacks and stops the transfer once it is set; the batch
//! checks it before each URL.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; visible to every clone.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Cancel this token after `after` elapses, from a detached timer thread.
    pub fn cancel_after(&self, after: Duration) -> JoinHandle<()> {
        let token = self.clone();
        std::thread::spawn(move || {
            std::thread::sleep(after);
            tracing::info!("deadline of {:?} reached, cancelling remaining downloads", after);
            token.cancel();
        })
    }
}
