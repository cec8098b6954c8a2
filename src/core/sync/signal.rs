/*!
 * Stop Signal
 *
 * Shared, idempotent shutdown flag that supports both event-driven wake and
 * bounded waiting. Periodic monitors sleep on it between ticks instead of
 * calling `thread::sleep`, so a stop request ends the wait immediately.
 */

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: AtomicBool,
    lock: Mutex<()>,
    changed: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop and wake every waiter. Idempotent.
    pub fn stop(&self) {
        let _guard = self.lock.lock();
        self.stopped.store(true, Ordering::Release);
        self.changed.notify_all();
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Sleep for up to `timeout`; returns `true` if a stop was requested
    ///
    /// Returns as soon as `stop` is called, never later than `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut guard = self.lock.lock();
        if !self.is_stopped() {
            self.changed
                .wait_while_for(&mut guard, |_| !self.is_stopped(), timeout);
        }
        self.is_stopped()
    }

    /// Block until a stop is requested
    pub fn wait(&self) {
        let mut guard = self.lock.lock();
        while !self.is_stopped() {
            self.changed.wait(&mut guard);
        }
    }
}
