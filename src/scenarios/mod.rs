/*!
 * Demo Scenarios
 *
 * Small workloads that exercise each primitive the way it is meant to be
 * used. The binary dispatches to these; tests call them with tiny sizes.
 */

mod deadlock;
mod histogram;
mod philosophers;
mod pipeline;
mod pool;
mod relay;
mod transfers;

pub use deadlock::{run_deadlock_demo, run_phase, DeadlockSummary, LockDiscipline, PhaseResult};
pub use histogram::{histogram, run_histogram};
pub use philosophers::{run_philosophers, DiningStrategy, DiningSummary, PhilosopherStats};
pub use pipeline::{run_pipeline, PipelineSummary};
pub use pool::{fib, run_fib_pool, FibSummary};
pub use relay::{run_relay, RelaySummary, TeamResult};
pub use transfers::{run_transfers, TransferSummary};

use crate::core::config::DemoConfig;
use crate::core::errors::{Result, SyncError};
use crate::core::limits;
use crate::monitoring::ScenarioSpan;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Pipeline,
    Transfers,
    Philosophers,
    Relay,
    Deadlock,
    Pool,
    Histogram,
    All,
}

impl Scenario {
    /// Every concrete scenario, in the order `All` runs them
    pub const EACH: [Scenario; 7] = [
        Scenario::Pipeline,
        Scenario::Transfers,
        Scenario::Philosophers,
        Scenario::Relay,
        Scenario::Deadlock,
        Scenario::Pool,
        Scenario::Histogram,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Pipeline => "pipeline",
            Scenario::Transfers => "transfers",
            Scenario::Philosophers => "philosophers",
            Scenario::Relay => "relay",
            Scenario::Deadlock => "deadlock",
            Scenario::Pool => "pool",
            Scenario::Histogram => "histogram",
            Scenario::All => "all",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Scenario::EACH
            .into_iter()
            .chain([Scenario::All])
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SyncError::invalid(format!("unknown scenario '{}'", s)))
    }
}

/// Run one scenario (or all of them) with the given sizes
pub fn run(scenario: Scenario, config: &DemoConfig) -> Result<()> {
    if scenario == Scenario::All {
        for each in Scenario::EACH {
            run(each, config)?;
        }
        return Ok(());
    }

    let span = ScenarioSpan::new(scenario.name());
    let _entered = span.enter();

    let summary = match scenario {
        Scenario::Pipeline => to_json(&run_pipeline(
            config.pipeline_items as u64,
            config.queue_capacity,
            limits::DEFAULT_SAMPLE_INTERVAL,
        )?),
        Scenario::Transfers => to_json(&run_transfers(
            config.accounts,
            config.transfer_threads,
            config.transfers_per_thread,
            limits::DEMO_INITIAL_BALANCE,
        )?),
        Scenario::Philosophers => {
            let ordered =
                run_philosophers(config.philosophers, config.run_duration, DiningStrategy::Ordered)?;
            let waiter =
                run_philosophers(config.philosophers, config.run_duration, DiningStrategy::Waiter)?;
            to_json(&[ordered, waiter])
        }
        Scenario::Relay => to_json(&run_relay(
            config.teams,
            config.runners_per_team,
            limits::DEMO_RELAY_LAPS,
            limits::DEMO_RELAY_MAX_LEG,
            config.run_duration * 4,
        )?),
        Scenario::Deadlock => to_json(&run_deadlock_demo(
            limits::DEMO_DEADLOCK_RESOURCES,
            limits::DEMO_DEADLOCK_WORKERS,
            config.run_duration,
            config.watchdog,
        )?),
        Scenario::Pool => to_json(&run_fib_pool(config.pool, limits::DEMO_FIB_JOBS)?),
        Scenario::Histogram => to_json(&run_histogram(
            limits::DEMO_HISTOGRAM_VALUES,
            limits::DEMO_HISTOGRAM_BINS,
            limits::DEMO_HISTOGRAM_PARTS,
        )?),
        Scenario::All => String::new(),
    };

    debug!(scenario = scenario.name(), summary = %summary, "scenario summary");
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "failed to serialize scenario summary");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenarios() {
        assert_eq!("pipeline".parse::<Scenario>().unwrap(), Scenario::Pipeline);
        assert_eq!(" ALL ".parse::<Scenario>().unwrap(), Scenario::All);
        assert!("nope".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for scenario in Scenario::EACH {
            assert_eq!(scenario.to_string().parse::<Scenario>().unwrap(), scenario);
        }
    }
}
