// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types for graph nodes and attached descriptors.
//!
//! Every identity in the typegraph is an arena index assigned once at
//! creation and never reused. Visited sets, memo tables, and collector
//! indices all key on these integers rather than on references, which keeps
//! traversal state trivially hashable and serializable.
use serde::{Deserialize, Serialize};

/// Strongly typed identifier for a type node in the graph arena.
///
/// `TypeId` is the canonical identity used for "same concrete node"
/// comparisons (e.g. when matching reciprocal relationship fields). Two
/// handles refer to the same node iff their `TypeId`s are equal.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Returns the arena slot this id addresses.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Strongly typed identifier for a materializer descriptor.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct MaterializerId(pub u32);

impl MaterializerId {
    /// Returns the arena slot this id addresses.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Strongly typed identifier for a runtime descriptor.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct RuntimeId(pub u32);

impl RuntimeId {
    /// Returns the arena slot this id addresses.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Strongly typed identifier for a policy descriptor.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct PolicyId(pub u32);

impl PolicyId {
    /// Returns the arena slot this id addresses.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
