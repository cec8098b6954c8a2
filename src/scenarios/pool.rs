/*!
 * Fibonacci Worker Pool
 *
 * Submits a batch of fibonacci jobs to a fixed pool and collects the
 * results through a channel.
 */

use crate::core::config::PoolConfig;
use crate::core::errors::Result;
use crate::pool::{PoolStats, WorkerPool};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FibSummary {
    pub stats: PoolStats,
    /// `(n, fib(n))`, sorted by `n`
    pub results: Vec<(u32, u64)>,
}

/// Iterative fibonacci, `fib(0) = 0`
pub fn fib(n: u32) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a.wrapping_add(b);
        a = b;
        b = next;
    }
    a
}

pub fn run_fib_pool(config: PoolConfig, jobs: u32) -> Result<FibSummary> {
    let (tx, rx) = flume::unbounded();
    let pool = WorkerPool::start(config, move |worker, n: u32| {
        let value = fib(n);
        debug!(worker, n, value, "fib computed");
        let _ = tx.send((n, value));
    })?;

    for n in 0..jobs {
        if pool.submit(n).is_err() {
            break;
        }
    }
    let stats = pool.shutdown();

    let mut results: Vec<(u32, u64)> = rx.drain().collect();
    results.sort_unstable();

    info!(
        submitted = stats.submitted,
        processed = stats.processed,
        "fibonacci pool finished"
    );
    Ok(FibSummary { stats, results })
}
