/*!
 * Cyclic Barrier
 *
 * Rendezvous point for a fixed number of parties, reusable across rounds.
 *
 * # Generation Fencing
 *
 * Each release bumps a generation counter. A waiter remembers the
 * generation it arrived in and keeps sleeping until that generation has
 * advanced, so neither spurious wakeups nor a later round's arrivals can
 * release it early. Resetting a bare arrival counter is not enough: a fast
 * thread re-entering the next round could otherwise be counted against the
 * round that is still waking up.
 *
 * # Shutdown
 *
 * `close()` wakes every waiter with `Closed` and makes all later waits fail
 * immediately, so a stopped team never leaves a runner stuck at the line.
 */

use crate::core::errors::{Result, SyncError};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of a completed rendezvous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierWaitResult {
    /// Generation produced by the release this caller took part in
    pub generation: u64,
    /// `true` for exactly one party per round: the last to arrive
    pub is_leader: bool,
}

impl BarrierWaitResult {
    #[inline]
    pub fn is_leader(&self) -> bool {
        self.is_leader
    }
}

struct BarrierState {
    arrived: usize,
    generation: u64,
    closed: bool,
}

/// Reusable barrier for `parties` threads per round
///
/// # Example
///
/// ```
/// use sync_patterns::CyclicBarrier;
/// use std::thread;
///
/// let barrier = CyclicBarrier::new(3).unwrap();
/// thread::scope(|s| {
///     let handles: Vec<_> = (0..3).map(|_| s.spawn(|| barrier.wait().unwrap())).collect();
///     for handle in handles {
///         assert_eq!(handle.join().unwrap().generation, 1);
///     }
/// });
/// ```
pub struct CyclicBarrier {
    state: Mutex<BarrierState>,
    released: Condvar,
    parties: usize,
}

impl CyclicBarrier {
    pub fn new(parties: usize) -> Result<Self> {
        if parties == 0 {
            return Err(SyncError::invalid("barrier parties must be > 0"));
        }

        Ok(Self {
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                closed: false,
            }),
            released: Condvar::new(),
            parties,
        })
    }

    /// Block until `parties` callers have arrived in the current round
    ///
    /// The last arrival resets the count, advances the generation and wakes
    /// the rest of its round. Returns `Closed` if the barrier is closed
    /// before this round completes.
    pub fn wait(&self) -> Result<BarrierWaitResult> {
        self.wait_inner(None)
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`
    ///
    /// A timed-out caller withdraws its arrival so the round still needs
    /// `parties` fresh arrivals.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<BarrierWaitResult> {
        self.wait_inner(Some(timeout))
    }

    fn wait_inner(&self, timeout: Option<Duration>) -> Result<BarrierWaitResult> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();

        if state.closed {
            return Err(SyncError::Closed);
        }

        let arrival_generation = state.generation;
        state.arrived += 1;

        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation += 1;
            let generation = state.generation;
            drop(state);
            self.released.notify_all();
            debug!(generation, parties = self.parties, "barrier released");
            return Ok(BarrierWaitResult {
                generation,
                is_leader: true,
            });
        }

        while state.generation == arrival_generation && !state.closed {
            match deadline {
                None => self.released.wait(&mut state),
                Some(deadline) => {
                    if self.released.wait_until(&mut state, deadline).timed_out()
                        && state.generation == arrival_generation
                        && !state.closed
                    {
                        state.arrived -= 1;
                        return Err(SyncError::TimedOut(timeout.unwrap_or_default()));
                    }
                }
            }
        }

        // A release that happened before close still counts for this round
        if state.generation != arrival_generation {
            return Ok(BarrierWaitResult {
                generation: arrival_generation + 1,
                is_leader: false,
            });
        }
        Err(SyncError::Closed)
    }

    /// Fail all current and future waits. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            debug!(
                generation = state.generation,
                waiting = state.arrived,
                "barrier closed"
            );
        }
        drop(state);
        self.released.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    #[inline(always)]
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Completed rounds so far
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Parties currently waiting in the open round
    pub fn arrived(&self) -> usize {
        self.state.lock().arrived
    }
}

impl fmt::Debug for CyclicBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CyclicBarrier")
            .field("parties", &self.parties)
            .field("arrived", &state.arrived)
            .field("generation", &state.generation)
            .field("closed", &state.closed)
            .finish()
    }
}
