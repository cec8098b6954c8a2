/*!
 * Ordered Lock Set
 *
 * A registry of uniquely identified resources, each behind its own mutex,
 * plus an acquisition protocol that makes multi-resource locking
 * deadlock-free.
 *
 * # Ordering Policy
 *
 * `acquire` sorts the requested ids ascending and locks them in that order;
 * the guard releases in exactly the reverse order. Since every acquirer
 * follows the same total order, no thread can hold a higher id while
 * waiting for a lower one, so no wait-for cycle can form.
 *
 * The guarantee only holds if the resources are never locked any other
 * way. `acquire_unordered` exists to reproduce the deadlock-prone
 * workload; it is not deadlock-free.
 *
 * # Diagnostics
 *
 * Each resource records its current holder (thread name and since when) in
 * an `ArcSwapOption`, so probes read it without taking any lock.
 * `try_acquire` and [`LockProbe::probe_all`] never wait and never keep a
 * resource they manage to lock.
 */

use super::traits::{LockProbe, ProbeState, ResourceProbe};
use crate::core::errors::{Result, SyncError};
use crate::core::types::ResourceId;
use crate::monitoring::ProgressMarker;
use arc_swap::ArcSwapOption;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::trace;

/// Who holds a resource, for diagnostics only
#[derive(Debug)]
struct Holder {
    thread: String,
    since: Instant,
}

impl Holder {
    fn current() -> Self {
        let current = thread::current();
        let thread = match current.name() {
            Some(name) => name.to_string(),
            None => format!("{:?}", current.id()),
        };
        Self {
            thread,
            since: Instant::now(),
        }
    }
}

struct Resource<T> {
    id: ResourceId,
    value: Mutex<T>,
    holder: ArcSwapOption<Holder>,
}

impl<T> Resource<T> {
    fn contended_state(&self) -> ProbeState {
        let holder = self.holder.load_full();
        ProbeState::Contended {
            holder: holder.as_ref().map(|h| h.thread.clone()),
            held_ms: holder
                .as_ref()
                .map(|h| h.since.elapsed().as_millis() as u64),
        }
    }
}

/// Acquisition counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSetStats {
    /// Completed multi-resource acquisitions
    pub acquisitions: u64,
    /// Acquisitions where at least one resource was not immediately free
    pub contended: u64,
    /// Acquisitions abandoned at their deadline
    pub timeouts: u64,
    /// Longest time spent acquiring a full set
    pub max_wait: Duration,
}

#[derive(Default)]
struct Counters {
    acquisitions: AtomicU64,
    contended: AtomicU64,
    timeouts: AtomicU64,
    max_wait_us: AtomicU64,
}

/// Resource table with deadlock-free multi-resource acquisition
///
/// `T` is the value protected by each resource (an account balance, a fork,
/// or just `()` when the resource is purely a token).
///
/// # Example
///
/// ```
/// use sync_patterns::{OrderedLockSet, ResourceId};
///
/// let accounts = OrderedLockSet::contiguous(3, |_| 100u64).unwrap();
/// {
///     let mut guard = accounts.acquire([ResourceId(2), ResourceId(0)]).unwrap();
///     let (from, to) = guard.pair_mut(ResourceId(2), ResourceId(0)).unwrap();
///     *from -= 30;
///     *to += 30;
/// }
/// let balances: Vec<u64> = accounts.snapshot().into_iter().map(|(_, v)| v).collect();
/// assert_eq!(balances, vec![130, 100, 70]);
/// ```
pub struct OrderedLockSet<T = ()> {
    resources: Vec<Resource<T>>,
    counters: Counters,
    progress: Option<Arc<ProgressMarker>>,
}

impl<T> OrderedLockSet<T> {
    /// Build from explicit `(id, value)` pairs
    ///
    /// Fails on an empty universe or a duplicated id.
    pub fn new(entries: impl IntoIterator<Item = (ResourceId, T)>) -> Result<Self> {
        let mut resources: Vec<Resource<T>> = entries
            .into_iter()
            .map(|(id, value)| Resource {
                id,
                value: Mutex::new(value),
                holder: ArcSwapOption::empty(),
            })
            .collect();

        if resources.is_empty() {
            return Err(SyncError::invalid("lock set needs at least one resource"));
        }

        resources.sort_by_key(|r| r.id);
        if let Some(pair) = resources.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(SyncError::invalid(format!(
                "duplicate resource id {}",
                pair[0].id
            )));
        }

        Ok(Self {
            resources,
            counters: Counters::default(),
            progress: None,
        })
    }

    /// Build a contiguous universe `0..count`, initializing each value
    pub fn contiguous(count: usize, mut init: impl FnMut(ResourceId) -> T) -> Result<Self> {
        Self::new((0..count).map(|i| {
            let id = ResourceId::from(i);
            (id, init(id))
        }))
    }

    /// Touch `marker` after every completed acquisition and its release
    ///
    /// An acquisition that times out part way is not progress: the
    /// resources it had obtained are released without touching the marker.
    pub fn with_progress(mut self, marker: Arc<ProgressMarker>) -> Self {
        self.progress = Some(marker);
        self
    }

    /// Lock every requested resource, ascending by id
    ///
    /// Duplicate ids are collapsed. Blocks until the whole set is held.
    pub fn acquire(
        &self,
        ids: impl IntoIterator<Item = ResourceId>,
    ) -> Result<LockSetGuard<'_, T>> {
        let order = self.ascending_indices(ids)?;
        self.lock_sequence(order, None)
    }

    /// Ordered acquisition that gives up after `timeout`
    ///
    /// Everything obtained so far is released before `TimedOut` is returned.
    pub fn acquire_timeout(
        &self,
        ids: impl IntoIterator<Item = ResourceId>,
        timeout: Duration,
    ) -> Result<LockSetGuard<'_, T>> {
        let order = self.ascending_indices(ids)?;
        self.lock_sequence(order, Some(timeout))
    }

    /// Lock resources in the order given by the caller
    ///
    /// Two callers using opposite orders can deadlock. With a `timeout` each
    /// lock attempt is bounded, everything held is released and `TimedOut`
    /// is returned, so a deadlocked workload stalls without hanging forever.
    /// Only for reproducing the failure mode or when an external limiter
    /// (such as a semaphore of `n - 1` permits) rules the cycle out.
    pub fn acquire_unordered(
        &self,
        ids: &[ResourceId],
        timeout: Option<Duration>,
    ) -> Result<LockSetGuard<'_, T>> {
        if ids.is_empty() {
            return Err(SyncError::EmptyRequest);
        }
        let mut order = Vec::with_capacity(ids.len());
        for &id in ids {
            let index = self.index_of(id)?;
            if !order.contains(&index) {
                order.push(index);
            }
        }
        self.lock_sequence(order, timeout)
    }

    /// Non-blocking probe: `true` if the resource was free
    ///
    /// On success the lock is released before returning; this never holds
    /// the resource.
    pub fn try_acquire(&self, id: ResourceId) -> Result<bool> {
        let resource = &self.resources[self.index_of(id)?];
        Ok(resource.value.try_lock().is_some())
    }

    /// Non-blocking probe with holder details
    pub fn probe(&self, id: ResourceId) -> Result<ProbeState> {
        let resource = &self.resources[self.index_of(id)?];
        Ok(Self::probe_resource(resource))
    }

    /// Clone every value, taking the whole set in ascending order
    ///
    /// Blocks until every resource is free. Does not count as progress.
    pub fn snapshot(&self) -> Vec<(ResourceId, T)>
    where
        T: Clone,
    {
        // Storage order is id order, so this follows the global ordering
        let held: Vec<MutexGuard<'_, T>> =
            self.resources.iter().map(|r| r.value.lock()).collect();
        self.resources
            .iter()
            .zip(&held)
            .map(|(resource, value)| (resource.id, (**value).clone()))
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources.iter().map(|r| r.id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn stats(&self) -> LockSetStats {
        LockSetStats {
            acquisitions: self.counters.acquisitions.load(Ordering::Relaxed),
            contended: self.counters.contended.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
            max_wait: Duration::from_micros(self.counters.max_wait_us.load(Ordering::Relaxed)),
        }
    }

    fn index_of(&self, id: ResourceId) -> Result<usize> {
        self.resources
            .binary_search_by_key(&id, |r| r.id)
            .map_err(|_| SyncError::UnknownResource(id))
    }

    fn ascending_indices(&self, ids: impl IntoIterator<Item = ResourceId>) -> Result<Vec<usize>> {
        let mut order = ids
            .into_iter()
            .map(|id| self.index_of(id))
            .collect::<Result<Vec<_>>>()?;
        if order.is_empty() {
            return Err(SyncError::EmptyRequest);
        }
        // Resources are stored sorted by id, so index order is id order
        order.sort_unstable();
        order.dedup();
        Ok(order)
    }

    fn lock_sequence(
        &self,
        order: Vec<usize>,
        timeout: Option<Duration>,
    ) -> Result<LockSetGuard<'_, T>> {
        let start = Instant::now();
        let deadline = timeout.map(|t| start + t);
        let mut guard = LockSetGuard {
            set: self,
            held: Vec::with_capacity(order.len()),
            completed: false,
        };
        let mut contended = false;

        for index in order {
            let resource = &self.resources[index];
            trace!(resource = %resource.id, "locking");

            let value = match resource.value.try_lock() {
                Some(value) => value,
                None => {
                    contended = true;
                    match deadline {
                        None => resource.value.lock(),
                        Some(deadline) => match resource.value.try_lock_until(deadline) {
                            Some(value) => value,
                            None => {
                                self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
                                trace!(resource = %resource.id, "acquisition timed out");
                                // Dropping `guard` releases what is held, in reverse
                                drop(guard);
                                return Err(SyncError::TimedOut(timeout.unwrap_or_default()));
                            }
                        },
                    }
                }
            };

            resource.holder.store(Some(Arc::new(Holder::current())));
            guard.held.push(Held {
                id: resource.id,
                index,
                guard: value,
            });
        }

        let waited = start.elapsed();
        self.counters.acquisitions.fetch_add(1, Ordering::Relaxed);
        if contended {
            self.counters.contended.fetch_add(1, Ordering::Relaxed);
        }
        self.counters
            .max_wait_us
            .fetch_max(waited.as_micros() as u64, Ordering::Relaxed);

        if let Some(progress) = &self.progress {
            progress.touch();
        }
        guard.completed = true;
        Ok(guard)
    }

    fn probe_resource(resource: &Resource<T>) -> ProbeState {
        match resource.value.try_lock() {
            Some(value) => {
                drop(value);
                ProbeState::Free
            }
            None => resource.contended_state(),
        }
    }
}

impl<T: Send> LockProbe for OrderedLockSet<T> {
    fn probe_all(&self) -> Vec<ResourceProbe> {
        self.resources
            .iter()
            .map(|resource| ResourceProbe {
                id: resource.id,
                state: Self::probe_resource(resource),
            })
            .collect()
    }
}

impl<T> fmt::Debug for OrderedLockSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedLockSet")
            .field("resources", &self.resources.len())
            .field("stats", &self.stats())
            .finish()
    }
}

struct Held<'a, T> {
    id: ResourceId,
    index: usize,
    guard: MutexGuard<'a, T>,
}

/// Scoped ownership of a set of resources
///
/// Dropping the guard releases every resource in reverse acquisition order,
/// whichever way the scope is left.
pub struct LockSetGuard<'a, T> {
    set: &'a OrderedLockSet<T>,
    held: Vec<Held<'a, T>>,
    /// Only a fully acquired set reports progress when released
    completed: bool,
}

impl<T> LockSetGuard<'_, T> {
    /// Held ids in acquisition order
    pub fn ids(&self) -> Vec<ResourceId> {
        self.held.iter().map(|h| h.id).collect()
    }

    pub fn get(&self, id: ResourceId) -> Option<&T> {
        self.held.iter().find(|h| h.id == id).map(|h| &*h.guard)
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut T> {
        self.held
            .iter_mut()
            .find(|h| h.id == id)
            .map(|h| &mut *h.guard)
    }

    /// Mutable access to two distinct held resources at once
    pub fn pair_mut(&mut self, a: ResourceId, b: ResourceId) -> Option<(&mut T, &mut T)> {
        if a == b {
            return None;
        }
        let ia = self.held.iter().position(|h| h.id == a)?;
        let ib = self.held.iter().position(|h| h.id == b)?;

        if ia < ib {
            let (low, high) = self.held.split_at_mut(ib);
            Some((&mut *low[ia].guard, &mut *high[0].guard))
        } else {
            let (low, high) = self.held.split_at_mut(ia);
            Some((&mut *high[0].guard, &mut *low[ib].guard))
        }
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl<T> Drop for LockSetGuard<'_, T> {
    fn drop(&mut self) {
        let released_any = !self.held.is_empty();
        while let Some(held) = self.held.pop() {
            // Clear the holder while still owning the lock so the next
            // owner's record is never overwritten.
            self.set.resources[held.index].holder.store(None);
            trace!(resource = %held.id, "releasing");
            drop(held.guard);
        }
        if released_any && self.completed {
            if let Some(progress) = &self.set.progress {
                progress.touch();
            }
        }
    }
}

impl<T> fmt::Debug for LockSetGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockSetGuard")
            .field("ids", &self.ids())
            .finish()
    }
}
