/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 *
 * Only configuration violations are fatal. Closing, draining and timeouts are
 * ordinary outcomes that callers branch on.
 */

use super::types::{InlineString, ResourceId};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Unified error type for the synchronization primitives
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(sync::invalid_configuration),
        help("Capacities, party counts, permits and durations must all be positive.")
    )]
    InvalidConfiguration(InlineString),

    #[error("Resource {0} is not part of the lock set")]
    #[diagnostic(
        code(sync::unknown_resource),
        help("Only ids registered when the lock set was built can be acquired or probed.")
    )]
    UnknownResource(ResourceId),

    #[error("Acquire requested an empty resource set")]
    #[diagnostic(
        code(sync::empty_request),
        help("Request at least one resource id.")
    )]
    EmptyRequest,

    #[error("Timed out after {0:?}")]
    #[diagnostic(
        code(sync::timed_out),
        help("The bounded wait expired before the operation could complete.")
    )]
    TimedOut(Duration),

    #[error("Primitive has been closed")]
    #[diagnostic(
        code(sync::closed),
        help("The primitive was shut down; no further waits will block.")
    )]
    Closed,

    #[error("Failed to spawn thread: {0}")]
    #[diagnostic(
        code(sync::spawn_failed),
        help("The OS refused to create a thread. Check process thread limits.")
    )]
    Spawn(InlineString),
}

impl SyncError {
    /// Shorthand for configuration failures
    pub fn invalid(msg: impl AsRef<str>) -> Self {
        SyncError::InvalidConfiguration(msg.as_ref().into())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Spawn(err.to_string().as_str().into())
    }
}

/// Result type for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Rejected insertion; the item is handed back to the caller
#[derive(Error, PartialEq, Eq)]
pub enum PutError<T> {
    #[error("queue closed")]
    Closed(T),

    #[error("queue full")]
    Full(T),

    #[error("timed out waiting for space")]
    Timeout(T),
}

impl<T> PutError<T> {
    /// Recover the rejected item
    pub fn into_inner(self) -> T {
        match self {
            PutError::Closed(item) | PutError::Full(item) | PutError::Timeout(item) => item,
        }
    }

    /// Whether the rejection was caused by the queue being closed
    pub fn is_closed(&self) -> bool {
        matches!(self, PutError::Closed(_))
    }
}

impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PutError::Closed(_) => f.write_str("Closed(..)"),
            PutError::Full(_) => f.write_str("Full(..)"),
            PutError::Timeout(_) => f.write_str("Timeout(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_serialization() {
        let error = SyncError::UnknownResource(ResourceId(9));
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: SyncError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_sync_error_display() {
        let error = SyncError::invalid("capacity must be > 0");
        assert_eq!(
            error.to_string(),
            "Invalid configuration: capacity must be > 0"
        );
    }

    #[test]
    fn test_put_error_returns_item() {
        let error = PutError::Closed(String::from("payload"));
        assert!(error.is_closed());
        assert_eq!(error.into_inner(), "payload");
    }

    #[test]
    fn test_put_error_debug_hides_payload() {
        let error = PutError::Full(vec![1u8; 1024]);
        assert_eq!(format!("{:?}", error), "Full(..)");
    }
}
