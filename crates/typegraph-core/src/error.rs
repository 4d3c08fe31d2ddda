// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for graph construction and serialization.
//!
//! Every error here is fatal to the current build: nothing in the core
//! catches these internally, they propagate to the top-level build call
//! which aborts. Each variant carries the addressing context (node names,
//! field names) the user needs to fix the declarative input.
use thiserror::Error;

/// Errors raised during graph construction and proxy resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two distinct nodes claim the same explicit name in one graph.
    #[error("duplicate type name `{name}`")]
    DuplicateName {
        /// The contested name.
        name: String,
    },
    /// One or more proxies never resolved against the graph's name table.
    ///
    /// Collected in a single resolution pass so all dangling references are
    /// reported together rather than one at a time.
    #[error("unresolved forward references: {}", names.join(", "))]
    UnresolvedProxies {
        /// Every proxy target name that failed to resolve, in id order.
        names: Vec<String>,
    },
    /// A proxy was dereferenced before (or without) a successful resolution
    /// pass.
    #[error("unknown reference `{name}`")]
    UnknownReference {
        /// The proxy's target name.
        name: String,
    },
    /// An id does not address a node in this graph.
    #[error("unknown type id {id}")]
    UnknownId {
        /// The out-of-range id.
        id: u32,
    },
}

/// Errors raised while flattening a graph into the wire document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// Construction-level failure surfaced during serialization (e.g. an
    /// unresolved proxy reached the collector).
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// A reachable node has no owning runtime after propagation.
    #[error("no runtime assigned for type `{node}`")]
    UnassignedRuntime {
        /// Display name of the orphaned node.
        node: String,
    },
    /// An exposed operation is not a function node.
    #[error("exposed operation `{name}` is not a function")]
    InvalidExpose {
        /// The operation name under the root struct.
        name: String,
    },
    /// An internal collector invariant was violated. Indicates a bug in the
    /// core, not in user input.
    #[error("internal serialization invariant violated: {0}")]
    Internal(&'static str),
}
