/*!
 * Synchronization Traits
 *
 * Seams between the primitives and the monitors that observe them. The
 * monitors only ever see these traits, so they can watch any container or
 * resource table without knowing its element type.
 */

use crate::core::types::ResourceId;
use serde::{Deserialize, Serialize};

/// Anything with a current fill level and a fixed capacity
pub trait Occupancy: Send + Sync {
    /// Items currently held
    fn occupancy(&self) -> usize;

    /// Maximum items that can be held
    fn capacity(&self) -> usize;
}

/// Lock state observed by a non-blocking probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeState {
    /// The probe obtained the lock and released it immediately
    Free,
    /// Someone holds the lock
    Contended {
        /// Name of the holding thread, if it was recorded in time
        holder: Option<String>,
        /// How long the holder has had it, in milliseconds
        held_ms: Option<u64>,
    },
}

impl ProbeState {
    #[inline]
    pub fn is_free(&self) -> bool {
        matches!(self, ProbeState::Free)
    }
}

/// Result of probing one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProbe {
    pub id: ResourceId,
    #[serde(flatten)]
    pub state: ProbeState,
}

/// A table of locks that can be inspected without blocking
///
/// Implementations must never wait for a lock and must release anything
/// they obtain before returning. Probing is diagnostic only.
pub trait LockProbe: Send + Sync {
    /// Snapshot every resource in ascending id order
    fn probe_all(&self) -> Vec<ResourceProbe>;
}
