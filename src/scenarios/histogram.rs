/*!
 * Histogram Map-Reduce
 *
 * Bins integers by `|v| % bins` in parallel partitions and merges the
 * partial histograms.
 */

use crate::core::errors::{Result, SyncError};
use crate::pool::map_reduce;
use rand::Rng;
use tracing::info;

/// Count `values` into `bins` buckets across `parts` threads
pub fn histogram(values: &[i64], bins: usize, parts: usize) -> Result<Vec<u64>> {
    if bins == 0 {
        return Err(SyncError::invalid("histogram needs at least one bin"));
    }

    map_reduce(
        values,
        parts,
        |chunk| {
            let mut counts = vec![0u64; bins];
            for v in chunk {
                counts[(v.unsigned_abs() % bins as u64) as usize] += 1;
            }
            counts
        },
        |mut acc, partial| {
            for (total, count) in acc.iter_mut().zip(partial) {
                *total += count;
            }
            acc
        },
    )
}

/// Generate `count` random values and bin them
pub fn run_histogram(count: usize, bins: usize, parts: usize) -> Result<Vec<u64>> {
    let mut rng = rand::thread_rng();
    let values: Vec<i64> = (0..count).map(|_| rng.gen_range(-1_000_000..=1_000_000)).collect();

    let counts = histogram(&values, bins, parts)?;
    info!(
        values = count,
        bins,
        parts,
        total = counts.iter().sum::<u64>(),
        "histogram finished"
    );
    Ok(counts)
}
