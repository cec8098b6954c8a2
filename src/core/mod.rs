/*!
 * Core Module
 * Configuration, error handling, shared types and the synchronization primitives
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use config::{DemoConfig, PoolConfig, ReportPolicy, WatchdogConfig};
pub use errors::*;
pub use types::*;
