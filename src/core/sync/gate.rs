/*!
 * Start Gate
 *
 * One-shot latch: every participant parks at the gate and all are released
 * together when it opens, so no runner gets a head start.
 */

use parking_lot::{Condvar, Mutex};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
pub struct StartGate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl StartGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the gate opens
    pub fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }

    /// Block until the gate opens or `timeout` passes; returns whether it is open
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut open = self.open.lock();
        if !*open {
            self.opened
                .wait_while_for(&mut open, |open| !*open, timeout);
        }
        *open
    }

    /// Release everyone. Idempotent.
    pub fn open(&self) {
        let mut open = self.open.lock();
        if !*open {
            *open = true;
            debug!("start gate opened");
        }
        drop(open);
        self.opened.notify_all();
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }
}
