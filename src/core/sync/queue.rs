/*!
 * Bounded Queue
 *
 * Fixed-capacity multi-producer/multi-consumer FIFO with blocking put/get
 * and an explicit close for shutdown.
 *
 * # Backpressure
 *
 * Producers block while the queue is full, so they are throttled to the
 * consumers' pace. Items are never dropped and the length never exceeds
 * `capacity`.
 *
 * # Shutdown
 *
 * `close()` flips a monotonic flag and wakes every blocked producer and
 * consumer. After close, `put` always fails (handing the item back) while
 * `get` keeps draining queued items and returns `None` once empty. No
 * sentinel values travel through the queue, so `T` is unconstrained.
 */

use super::traits::Occupancy;
use crate::core::errors::{PutError, Result, SyncError};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Point-in-time queue counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub capacity: usize,
    pub len: usize,
    pub closed: bool,
    /// Items accepted by `put`
    pub enqueued: u64,
    /// Items handed out by `get`
    pub dequeued: u64,
    /// Puts that had to wait for space
    pub blocked_puts: u64,
    /// Gets that had to wait for an item
    pub blocked_gets: u64,
    /// Highest length ever observed
    pub high_water: usize,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
    enqueued: u64,
    dequeued: u64,
    blocked_puts: u64,
    blocked_gets: u64,
    high_water: usize,
}

/// Thread-safe bounded FIFO channel
///
/// One exclusion lock and two condition variables, all scoped to this
/// instance. Share it with `Arc<BoundedQueue<T>>` or scoped threads.
///
/// # Example
///
/// ```
/// use sync_patterns::BoundedQueue;
/// use std::thread;
///
/// let queue = BoundedQueue::new(2).unwrap();
/// thread::scope(|s| {
///     s.spawn(|| {
///         for i in 0..5 {
///             queue.put(i).unwrap();
///         }
///         queue.close();
///     });
///     let received: Vec<_> = queue.iter().collect();
///     assert_eq!(received, vec![0, 1, 2, 3, 4]);
/// });
/// ```
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SyncError::invalid("queue capacity must be > 0"));
        }

        Ok(Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
                enqueued: 0,
                dequeued: 0,
                blocked_puts: 0,
                blocked_gets: 0,
                high_water: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        })
    }

    /// Append an item, blocking while the queue is full
    ///
    /// Returns `PutError::Closed(item)` if the queue is closed before or
    /// while waiting; the item is not inserted in that case.
    pub fn put(&self, item: T) -> std::result::Result<(), PutError<T>> {
        let mut state = self.state.lock();

        if state.items.len() >= self.capacity && !state.closed {
            state.blocked_puts += 1;
            trace!(capacity = self.capacity, "put blocked on full queue");
            while state.items.len() >= self.capacity && !state.closed {
                self.not_full.wait(&mut state);
            }
        }

        if state.closed {
            return Err(PutError::Closed(item));
        }

        self.push_locked(&mut state, item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Like [`put`](Self::put) but gives up after `timeout`
    pub fn put_timeout(&self, item: T, timeout: Duration) -> std::result::Result<(), PutError<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        if state.items.len() >= self.capacity && !state.closed {
            state.blocked_puts += 1;
            while state.items.len() >= self.capacity && !state.closed {
                if self.not_full.wait_until(&mut state, deadline).timed_out() {
                    if state.items.len() >= self.capacity && !state.closed {
                        return Err(PutError::Timeout(item));
                    }
                    break;
                }
            }
        }

        if state.closed {
            return Err(PutError::Closed(item));
        }

        self.push_locked(&mut state, item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Append without blocking
    pub fn try_put(&self, item: T) -> std::result::Result<(), PutError<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PutError::Closed(item));
        }
        if state.items.len() >= self.capacity {
            return Err(PutError::Full(item));
        }

        self.push_locked(&mut state, item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the oldest item, blocking while the queue is empty
    ///
    /// Returns `None` only when the queue is closed and fully drained.
    pub fn get(&self) -> Option<T> {
        let mut state = self.state.lock();

        if state.items.is_empty() && !state.closed {
            state.blocked_gets += 1;
            trace!("get blocked on empty queue");
            while state.items.is_empty() && !state.closed {
                self.not_empty.wait(&mut state);
            }
        }

        let item = self.pop_locked(&mut state)?;
        drop(state);
        self.not_full.notify_one();
        Some(item)
    }

    /// Like [`get`](Self::get) but gives up after `timeout`
    ///
    /// `Ok(None)` is end-of-stream; `Err(TimedOut)` means the queue is
    /// still open but stayed empty for the whole window.
    pub fn get_timeout(&self, timeout: Duration) -> Result<Option<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        if state.items.is_empty() && !state.closed {
            state.blocked_gets += 1;
            while state.items.is_empty() && !state.closed {
                if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                    if state.items.is_empty() && !state.closed {
                        return Err(SyncError::TimedOut(timeout));
                    }
                    break;
                }
            }
        }

        let item = self.pop_locked(&mut state);
        drop(state);
        if item.is_some() {
            self.not_full.notify_one();
        }
        Ok(item)
    }

    /// Remove the oldest item if one is available right now
    pub fn try_get(&self) -> Option<T> {
        let mut state = self.state.lock();
        let item = self.pop_locked(&mut state)?;
        drop(state);
        self.not_full.notify_one();
        Some(item)
    }

    /// Close the queue and wake every waiter. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            debug!(
                remaining = state.items.len(),
                enqueued = state.enqueued,
                "queue closed"
            );
        }
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            capacity: self.capacity,
            len: state.items.len(),
            closed: state.closed,
            enqueued: state.enqueued,
            dequeued: state.dequeued,
            blocked_puts: state.blocked_puts,
            blocked_gets: state.blocked_gets,
            high_water: state.high_water,
        }
    }

    /// Blocking iterator that ends at end-of-stream
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { queue: self }
    }

    #[inline]
    fn push_locked(&self, state: &mut QueueState<T>, item: T) {
        debug_assert!(state.items.len() < self.capacity);
        state.items.push_back(item);
        state.enqueued += 1;
        state.high_water = state.high_water.max(state.items.len());
    }

    #[inline]
    fn pop_locked(&self, state: &mut QueueState<T>) -> Option<T> {
        let item = state.items.pop_front()?;
        state.dequeued += 1;
        Some(item)
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl<T: Send> Occupancy for BoundedQueue<T> {
    fn occupancy(&self) -> usize {
        self.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consuming iterator over a [`BoundedQueue`]; blocks between items
pub struct Iter<'a, T> {
    queue: &'a BoundedQueue<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.get()
    }
}

impl<'a, T> IntoIterator for &'a BoundedQueue<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
