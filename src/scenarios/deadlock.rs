/*!
 * Deadlock Detection
 *
 * Two phases over the same small resource table, each watched by a stall
 * watchdog:
 * - unordered: worker `i` holds resource `i % n`, pauses, then wants
 *   `(i + 1) % n`. The hold-and-wait cycle freezes all workers, progress
 *   stops, and the watchdog reports with every resource contended.
 * - ordered: the same pairs through the ordered lock set. Progress never
 *   stops and nothing is reported.
 *
 * Unordered workers bound their second wait, so the phase still ends.
 */

use crate::core::config::WatchdogConfig;
use crate::core::errors::{Result, SyncError};
use crate::core::sync::{LockProbe, OrderedLockSet, StopSignal};
use crate::core::types::ResourceId;
use crate::monitoring::{ProgressMarker, StallReport, StallWatchdog};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockDiscipline {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub discipline: LockDiscipline,
    /// Critical sections completed with both resources held
    pub completed: u64,
    /// Second-resource waits abandoned at their deadline
    pub abandoned: u64,
    pub stalls: u64,
    /// First report, if any
    pub first_report: Option<StallReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlockSummary {
    pub unordered: PhaseResult,
    pub ordered: PhaseResult,
}

/// Run both phases back to back
pub fn run_deadlock_demo(
    resources: usize,
    workers: usize,
    duration: Duration,
    watchdog: WatchdogConfig,
) -> Result<DeadlockSummary> {
    let unordered = run_phase(LockDiscipline::Unordered, resources, workers, duration, watchdog)?;
    let ordered = run_phase(LockDiscipline::Ordered, resources, workers, duration, watchdog)?;

    info!(
        unordered_stalls = unordered.stalls,
        ordered_stalls = ordered.stalls,
        "deadlock demo finished"
    );
    Ok(DeadlockSummary { unordered, ordered })
}

/// Run one phase for `duration` under a fresh watchdog
pub fn run_phase(
    discipline: LockDiscipline,
    resources: usize,
    workers: usize,
    duration: Duration,
    watchdog: WatchdogConfig,
) -> Result<PhaseResult> {
    if resources < 2 {
        return Err(SyncError::invalid("deadlock demo needs at least 2 resources"));
    }

    let progress = Arc::new(ProgressMarker::new());
    let table = Arc::new(OrderedLockSet::contiguous(resources, |_| 0u64)?.with_progress(progress.clone()));
    progress.touch();

    let mut dog = StallWatchdog::start(
        progress,
        watchdog,
        table.clone() as Arc<dyn LockProbe>,
    )?;

    let stop = StopSignal::new();
    let completed = AtomicU64::new(0);
    let abandoned = AtomicU64::new(0);
    // Long enough for the watchdog to see the freeze before workers give up
    let second_wait = watchdog.timeout * 2 + watchdog.poll_interval * 2;

    info!(discipline = ?discipline, resources, workers, "deadlock phase start");
    thread::scope(|s| {
        for worker in 0..workers {
            let first = ResourceId::from(worker % resources);
            let second = ResourceId::from((worker + 1) % resources);
            let (table, stop, completed, abandoned) = (&*table, &stop, &completed, &abandoned);

            let spawned = thread::Builder::new()
                .name(format!("lock-worker-{}", worker))
                .spawn_scoped(s, move || {
                    let mut rng = rand::thread_rng();
                    while !stop.is_stopped() {
                        let pause = Duration::from_millis(rng.gen_range(10..=40));
                        let outcome = match discipline {
                            LockDiscipline::Unordered => {
                                hold_and_wait(table, first, second, pause, second_wait)
                            }
                            LockDiscipline::Ordered => table.acquire([first, second]).map(|mut held| {
                                thread::sleep(pause);
                                if let Some(value) = held.get_mut(first) {
                                    *value += 1;
                                }
                            }),
                        };
                        match outcome {
                            Ok(()) => completed.fetch_add(1, Ordering::Relaxed),
                            Err(_) => abandoned.fetch_add(1, Ordering::Relaxed),
                        };
                        stop.wait_timeout(Duration::from_millis(rng.gen_range(5..=20)));
                    }
                    debug!(worker, "lock worker exiting");
                });
            if let Err(err) = spawned {
                stop.stop();
                return Err(err.into());
            }
        }

        stop.wait_timeout(duration);
        stop.stop();
        Ok::<(), SyncError>(())
    })?;

    dog.stop();
    let reports: Vec<StallReport> = dog.reports().drain().collect();
    let result = PhaseResult {
        discipline,
        completed: completed.load(Ordering::Relaxed),
        abandoned: abandoned.load(Ordering::Relaxed),
        stalls: dog.stall_count(),
        first_report: reports.into_iter().next(),
    };

    info!(
        discipline = ?discipline,
        completed = result.completed,
        abandoned = result.abandoned,
        stalls = result.stalls,
        "deadlock phase finished"
    );
    Ok(result)
}

/// Lock `first`, pause while holding it, then wait a bounded time for `second`
fn hold_and_wait(
    table: &OrderedLockSet<u64>,
    first: ResourceId,
    second: ResourceId,
    pause: Duration,
    second_wait: Duration,
) -> Result<()> {
    let mut held_first = table.acquire_unordered(&[first], None)?;
    thread::sleep(pause);
    let mut held_second = table.acquire_unordered(&[second], Some(second_wait))?;

    if let Some(value) = held_first.get_mut(first) {
        *value += 1;
    }
    if let Some(value) = held_second.get_mut(second) {
        *value += 1;
    }
    Ok(())
}
