// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! typegraph-prisma: relationship inference and schema generation for the
//! storage-runtime binding.
//!
//! Given structs built in a `typegraph_core::TypeGraph`, [`manage`] infers
//! the relationship topology (one-to-one, one-to-many), assigns the owning
//! side, and validates explicit [`LinkSpec`] hints; [`build_model`] /
//! [`build_schema`] then render deterministic Prisma-dialect schema text
//! from the resolved [`Registry`].
//!
//! The registry lives for one build: create it fresh, manage the structs,
//! generate the schema, drop it.
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

mod error;
mod link;
mod registry;
mod relationship;
mod resolver;
mod schema;

// Re-exports for stable public API
/// Resolution and generation errors.
pub use error::RelationError;
/// Link declaration: relationship hints on a field's type.
pub use link::{link, LinkSpec};
/// Per-build resolution state.
pub use registry::Registry;
/// Resolved relationship data.
pub use relationship::{Cardinality, Relationship, RelationshipSide};
/// Relationship inference entrypoint.
pub use resolver::manage;
/// Deterministic schema text generation.
pub use schema::{build_model, build_schema};
