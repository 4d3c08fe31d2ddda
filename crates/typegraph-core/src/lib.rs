// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! typegraph-core: typed graph arena, builder, and wire-format serializer.
//!
//! A typegraph is built in one synchronous pass: user code allocates scalar,
//! struct, union, optional, array, and function nodes through an explicit
//! [`TypeGraph`] context (forward references go through named proxies),
//! resolves proxies in a single batched pass, then exposes its operations
//! via [`expose`], which propagates runtime ownership and flattens the
//! reachable graph into the four-table wire document.
//!
//! The graph is an owned build context, not ambient state: concurrent
//! builds are safe by construction because each owns its own arena.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod collect;
mod error;
mod expose;
mod graph;
mod ident;
mod node;
mod propagate;
mod runtime;
mod serialize;

// Re-exports for stable public API
/// Reachability collection into indexed tables.
pub use collect::{Collector, Tables};
/// Construction and serialization errors.
pub use error::{GraphError, SerializeError};
/// Top-level build entrypoint and its parameters.
pub use expose::{expose, TypegraphParams};
/// The graph arena and construction primitives.
pub use graph::TypeGraph;
/// Arena-index identifier types.
pub use ident::{MaterializerId, PolicyId, RuntimeId, TypeId};
/// Type node variants and per-node metadata.
pub use node::{Injection, NodeEntry, StringFormat, TypeNode};
/// Runtime ownership propagation pass.
pub use propagate::propagate_runtimes;
/// Opaque capability descriptors.
pub use runtime::{Materializer, Policy, Runtime};
/// Wire-format document types.
pub use serialize::{
    Meta, TypegraphDoc, WireMaterializer, WirePolicy, WireRuntime, WireType, FORMAT_VERSION,
};
