/*!
 * Three-Stage Pipeline
 *
 * produce -> square -> sum over two bounded queues. The producer emits in
 * bursts so backpressure is visible in the first queue's occupancy
 * timeline. End-of-stream travels down the pipeline by closing each queue
 * once its writer is done.
 */

use crate::core::errors::Result;
use crate::core::sync::{BoundedQueue, QueueStats};
use crate::monitoring::{OccupancyReport, OccupancySampler};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Items produced between pauses
const BURST_LEN: u64 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub produced: u64,
    pub transformed: u64,
    pub consumed: u64,
    pub sum: u64,
    pub expected_sum: u64,
    pub raw: QueueStats,
    pub squared: QueueStats,
    pub occupancy: OccupancyReport,
}

impl PipelineSummary {
    pub fn is_complete(&self) -> bool {
        self.produced == self.consumed && self.sum == self.expected_sum
    }
}

pub fn run_pipeline(
    items: u64,
    capacity: usize,
    sample_interval: Duration,
) -> Result<PipelineSummary> {
    let raw = Arc::new(BoundedQueue::<u64>::new(capacity)?);
    let squared = Arc::new(BoundedQueue::<u64>::new(capacity)?);
    let sampler = OccupancySampler::start(raw.clone(), sample_interval)?;

    let (produced, transformed, (consumed, sum)) = thread::scope(|s| {
        let producer = s.spawn(|| {
            let mut rng = rand::thread_rng();
            let mut produced = 0;
            for n in 1..=items {
                if raw.put(n).is_err() {
                    break;
                }
                produced += 1;
                if n % BURST_LEN == 0 {
                    thread::sleep(Duration::from_millis(rng.gen_range(1..=5)));
                }
            }
            raw.close();
            produced
        });

        let transformer = s.spawn(|| {
            let mut transformed = 0;
            for n in raw.iter() {
                if squared.put(n * n).is_err() {
                    break;
                }
                transformed += 1;
            }
            squared.close();
            transformed
        });

        let consumer = s.spawn(|| {
            let mut consumed = 0u64;
            let mut sum = 0u64;
            for n in squared.iter() {
                thread::sleep(Duration::from_micros(200));
                consumed += 1;
                sum += n;
            }
            (consumed, sum)
        });

        (
            producer.join().unwrap_or(0),
            transformer.join().unwrap_or(0),
            consumer.join().unwrap_or((0, 0)),
        )
    });

    let summary = PipelineSummary {
        produced,
        transformed,
        consumed,
        sum,
        expected_sum: (1..=items).map(|n| n * n).sum(),
        raw: raw.stats(),
        squared: squared.stats(),
        occupancy: sampler.stop(),
    };

    info!(
        produced = summary.produced,
        consumed = summary.consumed,
        sum = summary.sum,
        complete = summary.is_complete(),
        raw_high_water = summary.raw.high_water,
        blocked_puts = summary.raw.blocked_puts,
        avg_occupancy = summary.occupancy.average(),
        "pipeline finished"
    );
    Ok(summary)
}
