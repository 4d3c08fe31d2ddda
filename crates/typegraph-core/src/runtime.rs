// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Opaque capability descriptors: runtimes, materializers, and policies.
//!
//! The core never executes anything. A runtime names an execution engine,
//! a materializer names a behavior inside one, and a policy names an
//! access-control check. All three are carried as plain data and flattened
//! into their own wire tables by the collector.
use std::collections::BTreeMap;

use serde_json::Value;

use crate::ident::{MaterializerId, RuntimeId};

/// An execution engine descriptor (e.g. a storage engine or a function
/// runtime). Purely declarative inside the core.
#[derive(Debug, Clone, PartialEq)]
pub struct Runtime {
    /// Engine name (e.g. `"prisma"`, `"deno"`).
    pub name: String,
    /// Engine-specific configuration, passed through untouched.
    pub data: BTreeMap<String, Value>,
}

impl Runtime {
    /// Creates a runtime descriptor with no extra configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BTreeMap::new(),
        }
    }
}

/// An executable-behavior descriptor attached to a function node.
#[derive(Debug, Clone, PartialEq)]
pub struct Materializer {
    /// Behavior name within its runtime (e.g. `"findUnique"`).
    pub name: String,
    /// The runtime that executes this behavior.
    pub runtime: RuntimeId,
    /// Behavior-specific configuration, passed through untouched.
    pub data: BTreeMap<String, Value>,
}

impl Materializer {
    /// Creates a materializer descriptor with no extra configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, runtime: RuntimeId) -> Self {
        Self {
            name: name.into(),
            runtime,
            data: BTreeMap::new(),
        }
    }
}

/// An access-control descriptor attachable to any node.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Policy name (unique per graph by convention, not enforced).
    pub name: String,
    /// The materializer that evaluates this policy.
    pub materializer: MaterializerId,
}

impl Policy {
    /// Creates a policy descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, materializer: MaterializerId) -> Self {
        Self {
            name: name.into(),
            materializer,
        }
    }
}
