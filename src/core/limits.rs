/*!
 * Defaults and Constants
 *
 * Centralized location for default sizes, timeouts and demo workload knobs.
 * Organized by component.
 */

use std::time::Duration;

// =============================================================================
// QUEUE
// =============================================================================

/// Default bounded queue capacity used by pipelines
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

// =============================================================================
// WATCHDOG
// =============================================================================

/// Gap without progress after which a stall is reported
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_millis(2000);

/// How often the watchdog compares the progress marker against the clock
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

// =============================================================================
// WORKER POOL
// =============================================================================

/// Default number of pool workers
pub const DEFAULT_POOL_WORKERS: usize = 4;

/// Default pending-task capacity of a pool
pub const DEFAULT_POOL_QUEUE_CAPACITY: usize = 64;

// =============================================================================
// SAMPLING
// =============================================================================

/// Default occupancy sampling interval
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// DEMO WORKLOADS
// =============================================================================

/// Items pushed through the three-stage pipeline
pub const DEMO_PIPELINE_ITEMS: usize = 50;

/// Accounts in the transfer demo
pub const DEMO_ACCOUNTS: usize = 8;

/// Transfer threads
pub const DEMO_TRANSFER_THREADS: usize = 4;

/// Transfers per thread
pub const DEMO_TRANSFERS_PER_THREAD: usize = 10_000;

/// Starting balance of each account, in cents
pub const DEMO_INITIAL_BALANCE: u64 = 100_000;

/// Philosophers at the table
pub const DEMO_PHILOSOPHERS: usize = 5;

/// Relay teams and runners per team
pub const DEMO_TEAMS: usize = 2;
pub const DEMO_RUNNERS_PER_TEAM: usize = 3;

/// Laps per relay team and the longest single leg
pub const DEMO_RELAY_LAPS: u64 = 5;
pub const DEMO_RELAY_MAX_LEG: Duration = Duration::from_millis(300);

/// Resources and workers in the deadlock demo
pub const DEMO_DEADLOCK_RESOURCES: usize = 3;
pub const DEMO_DEADLOCK_WORKERS: usize = 6;

/// Histogram bins and partitions in the map-reduce demo
pub const DEMO_HISTOGRAM_BINS: usize = 10;
pub const DEMO_HISTOGRAM_VALUES: usize = 100_000;
pub const DEMO_HISTOGRAM_PARTS: usize = 4;

/// Fibonacci jobs submitted to the pool demo
pub const DEMO_FIB_JOBS: u32 = 40;

/// Wall-clock length of the timed demos
pub const DEMO_RUN_DURATION: Duration = Duration::from_secs(3);
