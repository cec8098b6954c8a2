/*!
 * Sync Patterns - Demo Entry Point
 *
 * Usage: sync-patterns [pipeline|transfers|philosophers|relay|deadlock|pool|histogram|all]
 *
 * Workload sizes come from `SYNC_PATTERNS_*` environment variables, see
 * `DemoConfig::from_env`.
 */

use std::error::Error;
use tracing::{error, info};

use sync_patterns::{init_tracing, scenarios, scenarios::Scenario, DemoConfig};

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let scenario: Scenario = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => Scenario::All,
    };
    let config = DemoConfig::from_env()?;

    info!(%scenario, "sync-patterns starting");
    if let Err(err) = scenarios::run(scenario, &config) {
        error!(%scenario, error = %err, "scenario failed");
        return Err(err.into());
    }
    info!("all done");
    Ok(())
}
