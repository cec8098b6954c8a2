/*!
 * Core Types
 * Common types shared by the synchronization primitives
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inline-optimized string for error and diagnostic messages
///
/// Short messages (≤23 bytes on 64-bit) are stored without heap allocation.
pub type InlineString = smartstring::alias::String;

/// Worker index inside a pool or scenario
pub type WorkerId = usize;

/// Identifier of a lockable resource
///
/// Ids are totally ordered; [`OrderedLockSet`](crate::core::sync::OrderedLockSet)
/// always locks in ascending id order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// Raw numeric id
    #[inline(always)]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Position of this id inside a contiguous `0..n` universe
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ResourceId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<usize> for ResourceId {
    #[inline]
    fn from(id: usize) -> Self {
        Self(id as u32)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}
