/*!
 * Sync Patterns Library
 * Blocking concurrency primitives with deadlock-free locking and stall detection
 *
 * - `BoundedQueue`: backpressured MPMC FIFO with close/drain semantics
 * - `OrderedLockSet`: multi-resource locking in a global ascending order
 * - `StallWatchdog`: progress-marker watchdog with non-blocking lock probes
 * - `CyclicBarrier`: reusable rendezvous with generation fencing
 */

pub mod core;
pub mod monitoring;
pub mod pool;
pub mod scenarios;

// Re-exports
pub use crate::core::config::{DemoConfig, PoolConfig, ReportPolicy, WatchdogConfig};
pub use crate::core::errors::{PutError, Result, SyncError};
pub use crate::core::sync::{
    BarrierWaitResult, BoundedQueue, CyclicBarrier, LockProbe, LockSetGuard, LockSetStats,
    Occupancy, OrderedLockSet, ProbeState, QueueStats, ResourceProbe, Semaphore,
    SemaphorePermit, StartGate, StopSignal,
};
pub use crate::core::types::{ResourceId, WorkerId};
pub use monitoring::{
    init_tracing, OccupancyReport, OccupancySampler, ProgressMarker, StallReport, StallWatchdog,
};
pub use pool::{map_reduce, partition, PoolStats, WorkerPool};
