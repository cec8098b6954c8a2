/*!
 * Worker Pool
 *
 * Fixed set of named worker threads consuming items from a shared
 * [`BoundedQueue`]. Submitters block when the queue is full.
 *
 * # Shutdown
 *
 * Close-then-drain: `shutdown` closes the queue, workers keep taking items
 * until the queue reports end-of-stream, then exit and are joined. Every
 * item accepted by `submit` is processed exactly once.
 */

use crate::core::config::PoolConfig;
use crate::core::errors::{PutError, Result};
use crate::core::sync::BoundedQueue;
use crate::core::types::WorkerId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Counters returned by [`WorkerPool::shutdown`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub submitted: u64,
    pub processed: u64,
}

/// Fixed-size pool of threads applying one handler to submitted items
pub struct WorkerPool<T> {
    queue: Arc<BoundedQueue<T>>,
    workers: Vec<JoinHandle<()>>,
    submitted: AtomicU64,
    processed: Arc<AtomicU64>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawn `config.workers` threads running `handler` on each item
    ///
    /// The handler receives the worker index alongside the item.
    pub fn start<F>(config: PoolConfig, handler: F) -> Result<Self>
    where
        F: Fn(WorkerId, T) + Send + Sync + 'static,
    {
        config.validate()?;

        let queue = Arc::new(BoundedQueue::new(config.queue_capacity)?);
        let processed = Arc::new(AtomicU64::new(0));
        let handler = Arc::new(handler);
        let mut workers = Vec::with_capacity(config.workers);

        for id in 0..config.workers {
            let queue_ref = queue.clone();
            let processed_ref = processed.clone();
            let handler = handler.clone();

            let spawned = thread::Builder::new()
                .name(format!("pool-worker-{}", id))
                .spawn(move || {
                    for item in queue_ref.iter() {
                        handler(id, item);
                        processed_ref.fetch_add(1, Ordering::AcqRel);
                    }
                    debug!(worker = id, "pool worker exiting");
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    queue.close();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(err.into());
                }
            }
        }

        debug!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "worker pool started"
        );

        Ok(Self {
            queue,
            workers,
            submitted: AtomicU64::new(0),
            processed,
        })
    }

    /// Queue an item, blocking while the pool is saturated
    ///
    /// Fails with `PutError::Closed` once shutdown has begun.
    pub fn submit(&self, item: T) -> std::result::Result<(), PutError<T>> {
        self.queue.put(item)?;
        let submitted = self.submitted.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(submitted, "task submitted");
        Ok(())
    }

    /// Stop accepting items; workers still finish what is queued
    pub fn close(&self) {
        self.queue.close();
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Items waiting for a worker
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Acquire)
    }

    /// Close the queue, let workers drain it, and join them
    pub fn shutdown(mut self) -> PoolStats {
        self.finish()
    }

    fn finish(&mut self) -> PoolStats {
        self.queue.close();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("pool worker panicked");
            }
        }

        let stats = PoolStats {
            submitted: self.submitted.load(Ordering::Acquire),
            processed: self.processed.load(Ordering::Acquire),
        };
        debug!(
            submitted = stats.submitted,
            processed = stats.processed,
            "worker pool shut down"
        );
        stats
    }
}

impl<T> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.queue.close();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
