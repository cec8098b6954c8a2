/*!
 * Occupancy Sampler
 *
 * Records the fill level of a bounded container at a fixed interval, giving
 * a timeline of how backpressure builds and drains under bursty load.
 */

use crate::core::errors::Result;
use crate::core::sync::{Occupancy, StopSignal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Occupancy timeline collected by a sampler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyReport {
    pub capacity: usize,
    pub interval: Duration,
    /// Fill levels in sampling order
    pub samples: Vec<usize>,
}

impl OccupancyReport {
    /// Mean occupancy, 0.0 when nothing was sampled
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<usize>() as f64 / self.samples.len() as f64
    }

    pub fn peak(&self) -> usize {
        self.samples.iter().copied().max().unwrap_or(0)
    }
}

/// Background occupancy sampler
pub struct OccupancySampler {
    stop: Arc<StopSignal>,
    handle: Option<JoinHandle<Vec<usize>>>,
    capacity: usize,
    interval: Duration,
}

impl OccupancySampler {
    /// Sample `target` every `interval` until stopped
    ///
    /// The first sample is taken immediately.
    pub fn start(target: Arc<dyn Occupancy>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(crate::core::errors::SyncError::invalid(
                "sample interval must be > 0",
            ));
        }

        let capacity = target.capacity();
        let stop = Arc::new(StopSignal::new());
        let handle = {
            let stop = stop.clone();
            thread::Builder::new()
                .name("occupancy-sampler".into())
                .spawn(move || {
                    let mut samples = Vec::new();
                    loop {
                        samples.push(target.occupancy());
                        if stop.wait_timeout(interval) {
                            break;
                        }
                    }
                    samples
                })?
        };

        Ok(Self {
            stop,
            handle: Some(handle),
            capacity,
            interval,
        })
    }

    /// Stop sampling and return the timeline
    pub fn stop(mut self) -> OccupancyReport {
        self.finish()
    }

    fn finish(&mut self) -> OccupancyReport {
        self.stop.stop();
        let samples = self
            .handle
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        debug!(samples = samples.len(), "occupancy sampler stopped");

        OccupancyReport {
            capacity: self.capacity,
            interval: self.interval,
            samples,
        }
    }
}

impl Drop for OccupancySampler {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.finish();
        }
    }
}
