/*!
 * Synchronization Primitives
 *
 * Blocking building blocks for shared-memory workloads:
 * - `BoundedQueue`: backpressured MPMC FIFO with explicit close
 * - `OrderedLockSet`: deadlock-free multi-resource locking
 * - `CyclicBarrier`: generation-fenced rendezvous for fixed parties
 * - `Semaphore`, `StartGate`, `StopSignal`: supporting coordination
 *
 * # Architecture
 *
 * Every primitive owns exactly one `parking_lot::Mutex` and the condition
 * variables scoped to it. No primitive locks another while holding its own
 * lock; `OrderedLockSet` is the only place a thread holds several locks,
 * and only in ascending id order.
 *
 * # Cancellation
 *
 * Every blocking wait observes a close/stop flag and returns within one
 * wake cycle once shutdown is requested.
 */

mod barrier;
mod gate;
mod ordered;
mod queue;
mod semaphore;
mod signal;
mod traits;

pub use barrier::{BarrierWaitResult, CyclicBarrier};
pub use gate::StartGate;
pub use ordered::{LockSetGuard, LockSetStats, OrderedLockSet};
pub use queue::{BoundedQueue, Iter, QueueStats};
pub use semaphore::{Semaphore, SemaphorePermit};
pub use signal::StopSignal;
pub use traits::{LockProbe, Occupancy, ProbeState, ResourceProbe};
