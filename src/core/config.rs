/*!
 * Configuration
 *
 * Construction-time configuration for the watchdog, worker pool and demo
 * binary. Every config validates itself before a component starts.
 */

use super::errors::{Result, SyncError};
use super::limits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the watchdog does after it has reported a stall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportPolicy {
    /// Treat the report time as a fresh baseline. An ongoing stall is
    /// reported again only once another full `timeout` has elapsed.
    #[default]
    Rebaseline,
    /// Report on every poll tick for as long as the gap exceeds `timeout`.
    EveryTick,
}

/// Stall watchdog configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Maximum tolerated gap between progress updates
    pub timeout: Duration,
    /// Interval between marker checks
    pub poll_interval: Duration,
    /// Behaviour after a report
    pub policy: ReportPolicy,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            timeout: limits::DEFAULT_STALL_TIMEOUT,
            poll_interval: limits::DEFAULT_POLL_INTERVAL,
            policy: ReportPolicy::Rebaseline,
        }
    }
}

impl WatchdogConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            policy: ReportPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReportPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(SyncError::invalid("watchdog timeout must be > 0"));
        }
        if self.poll_interval.is_zero() {
            return Err(SyncError::invalid("watchdog poll interval must be > 0"));
        }
        Ok(())
    }
}

/// Fixed worker pool configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Pending task capacity; submitters block when it is reached
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: limits::DEFAULT_POOL_WORKERS,
            queue_capacity: limits::DEFAULT_POOL_QUEUE_CAPACITY,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SyncError::invalid("pool must have at least one worker"));
        }
        if self.queue_capacity == 0 {
            return Err(SyncError::invalid("pool queue capacity must be > 0"));
        }
        Ok(())
    }
}

/// Demo binary parameters
///
/// Environment variables (all optional):
/// - SYNC_PATTERNS_QUEUE_CAPACITY
/// - SYNC_PATTERNS_ITEMS
/// - SYNC_PATTERNS_ACCOUNTS / SYNC_PATTERNS_THREADS / SYNC_PATTERNS_OPS
/// - SYNC_PATTERNS_PHILOSOPHERS
/// - SYNC_PATTERNS_TEAMS / SYNC_PATTERNS_RUNNERS
/// - SYNC_PATTERNS_WORKERS
/// - SYNC_PATTERNS_DURATION_MS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConfig {
    pub queue_capacity: usize,
    pub pipeline_items: usize,
    pub accounts: usize,
    pub transfer_threads: usize,
    pub transfers_per_thread: usize,
    pub philosophers: usize,
    pub teams: usize,
    pub runners_per_team: usize,
    pub pool: PoolConfig,
    pub run_duration: Duration,
    pub watchdog: WatchdogConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            queue_capacity: limits::DEFAULT_QUEUE_CAPACITY,
            pipeline_items: limits::DEMO_PIPELINE_ITEMS,
            accounts: limits::DEMO_ACCOUNTS,
            transfer_threads: limits::DEMO_TRANSFER_THREADS,
            transfers_per_thread: limits::DEMO_TRANSFERS_PER_THREAD,
            philosophers: limits::DEMO_PHILOSOPHERS,
            teams: limits::DEMO_TEAMS,
            runners_per_team: limits::DEMO_RUNNERS_PER_TEAM,
            pool: PoolConfig::default(),
            run_duration: limits::DEMO_RUN_DURATION,
            watchdog: WatchdogConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Build from `SYNC_PATTERNS_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            queue_capacity: env_or("SYNC_PATTERNS_QUEUE_CAPACITY", defaults.queue_capacity)?,
            pipeline_items: env_or("SYNC_PATTERNS_ITEMS", defaults.pipeline_items)?,
            accounts: env_or("SYNC_PATTERNS_ACCOUNTS", defaults.accounts)?,
            transfer_threads: env_or("SYNC_PATTERNS_THREADS", defaults.transfer_threads)?,
            transfers_per_thread: env_or("SYNC_PATTERNS_OPS", defaults.transfers_per_thread)?,
            philosophers: env_or("SYNC_PATTERNS_PHILOSOPHERS", defaults.philosophers)?,
            teams: env_or("SYNC_PATTERNS_TEAMS", defaults.teams)?,
            runners_per_team: env_or("SYNC_PATTERNS_RUNNERS", defaults.runners_per_team)?,
            pool: PoolConfig {
                workers: env_or("SYNC_PATTERNS_WORKERS", defaults.pool.workers)?,
                ..defaults.pool
            },
            run_duration: Duration::from_millis(env_or(
                "SYNC_PATTERNS_DURATION_MS",
                defaults.run_duration.as_millis() as u64,
            )?),
            watchdog: defaults.watchdog,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("queue capacity", self.queue_capacity),
            ("pipeline items", self.pipeline_items),
            ("transfer threads", self.transfer_threads),
            ("teams", self.teams),
            ("runners per team", self.runners_per_team),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SyncError::invalid(format!("{} must be > 0", name)));
            }
        }
        if self.accounts < 2 {
            return Err(SyncError::invalid("transfers need at least 2 accounts"));
        }
        if self.philosophers < 2 {
            return Err(SyncError::invalid("need at least 2 philosophers"));
        }
        if self.run_duration.is_zero() {
            return Err(SyncError::invalid("run duration must be > 0"));
        }
        self.pool.validate()?;
        self.watchdog.validate()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SyncError::invalid(format!("{}={:?} is not a valid value", key, raw))),
        Err(_) => Ok(default),
    }
}
