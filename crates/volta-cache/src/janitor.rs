//! Background sweep that evicts expired path cache entries.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::PathCache;

#[derive(Debug, Default)]
struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
    sweeps: AtomicU64,
}

/// Runs [`PathCache::cleanup`] on a fixed period from a dedicated thread.
///
/// The thread stops when [`CacheJanitor::stop`] is called or the janitor is
/// dropped. Stopping wakes the thread immediately rather than waiting out
/// the current period.
#[derive(Debug)]
pub struct CacheJanitor {
    signal: Arc<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl CacheJanitor {
    /// Start sweeping `cache` every `interval`.
    pub fn spawn(cache: Arc<PathCache>, interval: Duration) -> std::io::Result<Self> {
        let signal = Arc::new(Signal::default());
        let worker = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name("volta-cache-janitor".into())
            .spawn(move || {
                debug!(?interval, "cache janitor started");
                loop {
                    let mut stopped = worker.stopped.lock();
                    if !*stopped {
                        worker.wake.wait_for(&mut stopped, interval);
                    }
                    if *stopped {
                        break;
                    }
                    drop(stopped);

                    let removed = cache.cleanup();
                    worker.sweeps.fetch_add(1, Ordering::AcqRel);
                    trace!(removed, remaining = cache.len(), "cache janitor sweep");
                }
                debug!("cache janitor stopped");
            })?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Number of sweeps completed so far.
    pub fn sweeps(&self) -> u64 {
        self.signal.sweeps.load(Ordering::Acquire)
    }

    /// `true` while the sweep thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the sweep thread and wait for it to exit.
    ///
    /// Returns `false` if the thread had panicked.
    pub fn stop(mut self) -> bool {
        self.shutdown()
    }

    fn shutdown(&mut self) -> bool {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();
        let Some(handle) = self.handle.take() else {
            return true;
        };
        match handle.join() {
            Ok(()) => true,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(%reason, sweeps = self.sweeps(), "cache janitor thread panicked");
                false
            }
        }
    }
}

impl Drop for CacheJanitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
