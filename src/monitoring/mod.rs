/*!
 * Monitoring
 * Liveness tracking, stall detection, occupancy sampling and tracing setup
 */

mod progress;
mod sampler;
mod tracer;
mod watchdog;

pub use progress::ProgressMarker;
pub use sampler::{OccupancyReport, OccupancySampler};
pub use tracer::{init_tracing, ScenarioSpan};
pub use watchdog::{StallReport, StallWatchdog};
