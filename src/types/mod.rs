//! Small identifier types shared across the crate.

#![forbid(unsafe_code)]

use std::fmt;

/// Dense index of a user inside a [`crate::CoachingGraph`].
///
/// Indices are assigned in insertion order and never reused; nodes are never
/// deleted once created.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    /// Returns the index as a `usize` suitable for slice access.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for NodeIdx {
    fn from(value: u32) -> Self {
        NodeIdx(value)
    }
}

impl From<NodeIdx> for u32 {
    fn from(value: NodeIdx) -> Self {
        value.0
    }
}
