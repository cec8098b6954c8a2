/*!
 * Tracing Setup
 * Structured logging for the demo binary and scenario runs
 *
 * Environment variables:
 * - RUST_LOG: log filter (default: info)
 * - SYNC_PATTERNS_TRACE_JSON: emit JSON lines instead of compact text
 */

use std::time::{Duration, Instant};
use tracing::{debug, info, span, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize the global subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("SYNC_PATTERNS_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!(json = use_json, "tracing initialized");
    }
}

/// Span covering one scenario run; logs the elapsed time when dropped
pub struct ScenarioSpan {
    span: tracing::Span,
    name: &'static str,
    start: Instant,
}

impl ScenarioSpan {
    pub fn new(name: &'static str) -> Self {
        let span = span!(Level::INFO, "scenario", name, elapsed_ms = tracing::field::Empty);
        Self {
            span,
            name,
            start: Instant::now(),
        }
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScenarioSpan {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        self.span.record("elapsed_ms", elapsed_ms);
        let _entered = self.span.enter();
        info!(scenario = self.name, elapsed_ms, "scenario finished");
    }
}
