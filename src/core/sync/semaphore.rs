/*!
 * Counting Semaphore
 *
 * Limits how many threads may be inside a region at once. The dining
 * philosophers "limiter" solution seats at most `n - 1` philosophers, which
 * breaks the circular wait even when forks are taken in arbitrary order.
 */

use crate::core::errors::{Result, SyncError};
use parking_lot::{Condvar, Mutex};
use std::fmt;

struct SemaphoreState {
    available: usize,
    closed: bool,
}

/// Counting semaphore with RAII permits
pub struct Semaphore {
    state: Mutex<SemaphoreState>,
    changed: Condvar,
    permits: usize,
}

impl Semaphore {
    pub fn new(permits: usize) -> Result<Self> {
        if permits == 0 {
            return Err(SyncError::invalid("semaphore permits must be > 0"));
        }

        Ok(Self {
            state: Mutex::new(SemaphoreState {
                available: permits,
                closed: false,
            }),
            changed: Condvar::new(),
            permits,
        })
    }

    /// Take one permit, blocking while none are available
    pub fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        let mut state = self.state.lock();
        while state.available == 0 && !state.closed {
            self.changed.wait(&mut state);
        }
        if state.closed {
            return Err(SyncError::Closed);
        }
        state.available -= 1;
        Ok(SemaphorePermit { semaphore: self })
    }

    pub fn try_acquire(&self) -> Option<SemaphorePermit<'_>> {
        let mut state = self.state.lock();
        if state.closed || state.available == 0 {
            return None;
        }
        state.available -= 1;
        Some(SemaphorePermit { semaphore: self })
    }

    /// Wake every waiter with `Closed`; outstanding permits stay valid
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.changed.notify_all();
    }

    pub fn available(&self) -> usize {
        self.state.lock().available
    }

    #[inline(always)]
    pub fn permits(&self) -> usize {
        self.permits
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.available += 1;
        debug_assert!(state.available <= self.permits);
        drop(state);
        self.changed.notify_one();
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("permits", &self.permits)
            .field("available", &self.available())
            .finish()
    }
}

/// Returns its permit on drop
#[must_use = "the permit is released as soon as it is dropped"]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
