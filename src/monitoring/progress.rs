/*!
 * Progress Marker
 *
 * Single monotonically non-decreasing "last progress" timestamp. Any number
 * of workers write it, the watchdog reads it. Writers race benignly: the
 * marker always reflects some write, and never moves backwards.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Shared liveness timestamp
///
/// Stored as nanoseconds since the marker's creation, offset by one so that
/// zero can mean "never touched".
#[derive(Debug)]
pub struct ProgressMarker {
    origin: Instant,
    last: AtomicU64,
}

impl ProgressMarker {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last: AtomicU64::new(0),
        }
    }

    /// Record progress now
    #[inline]
    pub fn touch(&self) {
        let offset = self.origin.elapsed().as_nanos() as u64 + 1;
        self.last.fetch_max(offset, Ordering::Release);
    }

    /// When progress was last recorded, if ever
    pub fn last_progress(&self) -> Option<Instant> {
        match self.last.load(Ordering::Acquire) {
            0 => None,
            offset => Some(self.origin + Duration::from_nanos(offset - 1)),
        }
    }

    /// Time since the last recorded progress, if any
    pub fn since_last_progress(&self) -> Option<Duration> {
        self.last_progress().map(|at| at.elapsed())
    }

    pub fn has_progressed(&self) -> bool {
        self.last.load(Ordering::Acquire) != 0
    }
}

impl Default for ProgressMarker {
    fn default() -> Self {
        Self::new()
    }
}
