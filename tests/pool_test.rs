/*!
 * Worker Pool and Map-Reduce Tests
 */

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sync_patterns::scenarios::{fib, histogram};
use sync_patterns::{map_reduce, partition, PoolConfig, SyncError, WorkerPool};

#[test]
fn test_pool_uses_every_worker() {
    let workers_seen = Arc::new(Mutex::new(HashSet::new()));
    let sink = workers_seen.clone();
    let pool = WorkerPool::start(
        PoolConfig {
            workers: 3,
            queue_capacity: 4,
        },
        move |worker, _: u32| {
            sink.lock().insert(worker);
            thread::sleep(Duration::from_millis(5));
        },
    )
    .unwrap();

    for n in 0..60 {
        pool.submit(n).unwrap();
    }
    let stats = pool.shutdown();

    assert_eq!(stats.processed, 60);
    assert_eq!(workers_seen.lock().len(), 3);
}

#[test]
fn test_shutdown_drains_pending_work() {
    let done = Arc::new(Mutex::new(Vec::new()));
    let sink = done.clone();
    let pool = WorkerPool::start(
        PoolConfig {
            workers: 1,
            queue_capacity: 16,
        },
        move |_, n: u32| {
            thread::sleep(Duration::from_millis(2));
            sink.lock().push(n);
        },
    )
    .unwrap();

    for n in 0..16 {
        pool.submit(n).unwrap();
    }
    let stats = pool.shutdown();

    assert_eq!(stats.submitted, 16);
    assert_eq!(*done.lock(), (0..16).collect::<Vec<_>>());
}

#[test]
fn test_fib_values() {
    let expected = [0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55];
    for (n, value) in expected.iter().enumerate() {
        assert_eq!(fib(n as u32), *value);
    }
    assert_eq!(fib(90), 2_880_067_194_370_816_120);
}

#[test]
fn test_partition_covers_range() {
    for (len, parts) in [(0, 1), (1, 3), (10, 3), (100, 7), (7, 7)] {
        let ranges = partition(len, parts).unwrap();
        assert_eq!(ranges.len(), parts);
        assert_eq!(ranges.first().unwrap().start, 0);
        assert_eq!(ranges.last().unwrap().end, len);
        assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));
    }
}

#[test]
fn test_histogram_matches_sequential() {
    let values: Vec<i64> = (-5_000..5_000).map(|v| v * 37 % 1_013).collect();
    let bins = 10;

    let mut expected = vec![0u64; bins];
    for v in &values {
        expected[(v.unsigned_abs() % bins as u64) as usize] += 1;
    }

    for parts in [1, 2, 3, 8] {
        assert_eq!(histogram(&values, bins, parts).unwrap(), expected);
    }
}

#[test]
fn test_histogram_rejects_zero_bins_and_parts() {
    let values = [1i64, 2, 3];
    assert!(matches!(
        histogram(&values, 0, 2),
        Err(SyncError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        histogram(&values, 4, 0),
        Err(SyncError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_map_reduce_max() {
    let values: Vec<u32> = (0..10_000).map(|v| (v * 7919) % 10_007).collect();
    let max = map_reduce(&values, 5, |chunk| chunk.iter().copied().max().unwrap_or(0), u32::max)
        .unwrap();
    assert_eq!(max, *values.iter().max().unwrap());
}
