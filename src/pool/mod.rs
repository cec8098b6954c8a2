/*!
 * Worker Pools
 * Fixed thread pool over a bounded queue and partitioned map-reduce
 */

mod partition;
mod worker_pool;

pub use partition::{map_reduce, partition};
pub use worker_pool::{PoolStats, WorkerPool};
