/*!
 * Stall Watchdog
 *
 * Background monitor that polls a shared [`ProgressMarker`]. When the marker
 * has not advanced within `timeout` (or was never set) it reports a stall
 * and probes every resource's lock state without blocking.
 *
 * Detection only: the watchdog never unlocks, interrupts or otherwise
 * intervenes. Reports go to the log (`warn!`) and to a bounded channel
 * that callers may drain.
 *
 * # Report Policy
 *
 * - `Rebaseline`: the report time becomes the new baseline, so an ongoing
 *   stall is reported again only after another full `timeout`.
 * - `EveryTick`: report on every poll tick while the gap exceeds `timeout`.
 *
 * # Timing
 *
 * With progress at least every `Δ < timeout` nothing is reported. Once
 * progress stops, the first report arrives within `timeout + poll_interval`.
 */

use super::progress::ProgressMarker;
use crate::core::config::{ReportPolicy, WatchdogConfig};
use crate::core::errors::Result;
use crate::core::sync::{LockProbe, ResourceProbe, StopSignal};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Reports buffered for callers before new ones are dropped
const REPORT_CHANNEL_CAPACITY: usize = 64;

/// Diagnostic snapshot emitted when progress stops
///
/// Informational only; producing it never unblocks anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallReport {
    /// 1-based report counter for this watchdog
    pub sequence: u64,
    /// Time since the last progress (or baseline); `None` if never set
    pub gap: Option<Duration>,
    pub timeout: Duration,
    /// Lock state of every observed resource at report time
    pub resources: Vec<ResourceProbe>,
    pub detected_at_unix_ms: u64,
}

impl StallReport {
    /// Resources that were held when the report was taken
    pub fn contended(&self) -> impl Iterator<Item = &ResourceProbe> {
        self.resources.iter().filter(|probe| !probe.state.is_free())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Pure stall decision, separated from the polling thread
#[derive(Debug, Clone)]
pub(crate) struct StallDetector {
    timeout: Duration,
    policy: ReportPolicy,
    baseline: Option<Instant>,
}

impl StallDetector {
    pub(crate) fn new(config: &WatchdogConfig) -> Self {
        Self {
            timeout: config.timeout,
            policy: config.policy,
            baseline: None,
        }
    }

    /// `Some(gap)` if a stall should be reported at `now`
    ///
    /// The inner `None` means no reference point exists yet (the marker was
    /// never set and nothing has been reported).
    pub(crate) fn check(
        &mut self,
        now: Instant,
        last_progress: Option<Instant>,
    ) -> Option<Option<Duration>> {
        let reference = match (last_progress, self.baseline) {
            (Some(progress), Some(baseline)) => Some(progress.max(baseline)),
            (progress, baseline) => progress.or(baseline),
        };

        let gap = reference.map(|at| now.saturating_duration_since(at));
        let stalled = match gap {
            None => true,
            Some(gap) => gap > self.timeout,
        };
        if !stalled {
            return None;
        }

        if self.policy == ReportPolicy::Rebaseline {
            self.baseline = Some(now);
        }
        Some(gap)
    }
}

/// Handle to a running watchdog thread
///
/// Dropping the handle stops the thread and joins it.
pub struct StallWatchdog {
    stop: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
    reports: flume::Receiver<StallReport>,
    stalls: Arc<AtomicU64>,
}

impl StallWatchdog {
    /// Spawn the watchdog
    ///
    /// `resources` is probed with non-blocking try-locks on every report.
    pub fn start(
        progress: Arc<ProgressMarker>,
        config: WatchdogConfig,
        resources: Arc<dyn LockProbe>,
    ) -> Result<Self> {
        config.validate()?;

        let stop = Arc::new(StopSignal::new());
        let stalls = Arc::new(AtomicU64::new(0));
        let (tx, rx) = flume::bounded(REPORT_CHANNEL_CAPACITY);

        let handle = {
            let stop = stop.clone();
            let stalls = stalls.clone();
            thread::Builder::new()
                .name("stall-watchdog".into())
                .spawn(move || {
                    run_watchdog(&progress, &config, resources.as_ref(), &stop, &stalls, &tx)
                })?
        };

        debug!(
            timeout_ms = config.timeout.as_millis() as u64,
            poll_ms = config.poll_interval.as_millis() as u64,
            policy = ?config.policy,
            "stall watchdog started"
        );

        Ok(Self {
            stop,
            handle: Some(handle),
            reports: rx,
            stalls,
        })
    }

    /// Stall reports not yet consumed
    pub fn reports(&self) -> &flume::Receiver<StallReport> {
        &self.reports
    }

    /// Total stalls reported so far
    pub fn stall_count(&self) -> u64 {
        self.stalls.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it to exit. Idempotent.
    pub fn stop(&mut self) {
        self.stop.stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("stall watchdog thread panicked");
            }
            debug!(stalls = self.stall_count(), "stall watchdog stopped");
        }
    }
}

impl Drop for StallWatchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_watchdog(
    progress: &ProgressMarker,
    config: &WatchdogConfig,
    resources: &dyn LockProbe,
    stop: &StopSignal,
    stalls: &AtomicU64,
    tx: &flume::Sender<StallReport>,
) {
    let mut detector = StallDetector::new(config);

    while !stop.wait_timeout(config.poll_interval) {
        let Some(gap) = detector.check(Instant::now(), progress.last_progress()) else {
            continue;
        };

        let sequence = stalls.fetch_add(1, Ordering::AcqRel) + 1;
        let report = StallReport {
            sequence,
            gap,
            timeout: config.timeout,
            resources: resources.probe_all(),
            detected_at_unix_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default(),
        };

        warn!(
            sequence,
            gap_ms = gap.map(|g| g.as_millis() as u64),
            timeout_ms = config.timeout.as_millis() as u64,
            contended = report.contended().count(),
            "no progress detected, possible deadlock or stall"
        );
        for probe in &report.resources {
            warn!(resource = %probe.id, state = ?probe.state, "resource state");
        }

        if tx.try_send(report).is_err() {
            debug!(sequence, "stall report dropped, channel full or closed");
        }
    }
}
