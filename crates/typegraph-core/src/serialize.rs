// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire-format document types.
//!
//! The exchange format consumed by downstream engines is four flat tables
//! (types, materializers, runtimes, policies) plus a metadata block and a
//! root pointer. Every cross-reference between tables is a `u32` index into
//! one of the four tables; no names or nested nodes cross the wire.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::{Injection, StringFormat};

/// Version tag stamped into [`Meta::version`].
pub const FORMAT_VERSION: &str = "typegraph/v1";

/// One flattened type node.
///
/// Exactly the child fields relevant to `kind` are populated; the rest stay
/// `None` and are omitted from the serialized form. Proxies never appear:
/// the collector follows them to concrete nodes before emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireType {
    /// Variant tag (`"struct"`, `"integer"`, ...).
    pub kind: String,
    /// Display name: the node's explicit name or its synthesized one.
    pub title: String,
    /// Index into [`TypegraphDoc::runtimes`].
    pub runtime: u32,
    /// Indices into [`TypegraphDoc::policies`], in attachment order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<u32>,
    /// Injection descriptor, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection: Option<Injection>,
    /// Runtime-config bag, if non-empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, Value>,
    /// String refinement format (`kind == "string"` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,
    /// Inner type index (`kind == "optional"` or `"array"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<u32>,
    /// Field name/type pairs in declaration order (`kind == "struct"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<(String, u32)>>,
    /// Variant type indices (`kind == "union"` or `"either"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<u32>>,
    /// Input struct index (`kind == "function"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<u32>,
    /// Output type index (`kind == "function"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<u32>,
    /// Index into [`TypegraphDoc::materializers`] (`kind == "function"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materializer: Option<u32>,
}

impl WireType {
    /// Creates a wire node with only the common fields populated.
    #[must_use]
    pub fn bare(kind: &str, title: String, runtime: u32) -> Self {
        Self {
            kind: kind.to_owned(),
            title,
            runtime,
            policies: Vec::new(),
            injection: None,
            config: BTreeMap::new(),
            format: None,
            item: None,
            properties: None,
            variants: None,
            input: None,
            output: None,
            materializer: None,
        }
    }
}

/// One flattened materializer descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMaterializer {
    /// Behavior name within its runtime.
    pub name: String,
    /// Index into [`TypegraphDoc::runtimes`].
    pub runtime: u32,
    /// Behavior-specific configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

/// One flattened runtime descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRuntime {
    /// Engine name.
    pub name: String,
    /// Engine-specific configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

/// One flattened policy descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePolicy {
    /// Policy name.
    pub name: String,
    /// Index into [`TypegraphDoc::materializers`].
    pub materializer: u32,
}

/// Metadata block carried alongside the four tables.
///
/// Auth providers, rate limits, and CORS are opaque data: the core neither
/// validates nor interprets them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Meta {
    /// Wire format version tag ([`FORMAT_VERSION`]).
    pub version: String,
    /// Declared auth providers, passed through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth: Vec<Value>,
    /// Rate-limit configuration, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Value>,
    /// CORS configuration, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<Value>,
}

/// The canonical exchange document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypegraphDoc {
    /// Flattened type nodes; the table every `item`/`properties`/`input`/
    /// `output` index points into.
    pub types: Vec<WireType>,
    /// Flattened materializer descriptors.
    pub materializers: Vec<WireMaterializer>,
    /// Flattened runtime descriptors.
    pub runtimes: Vec<WireRuntime>,
    /// Flattened policy descriptors.
    pub policies: Vec<WirePolicy>,
    /// Metadata block.
    pub meta: Meta,
    /// Index of the synthetic root struct in [`Self::types`].
    pub root: u32,
}

impl TypegraphDoc {
    /// Renders the document as JSON.
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error if encoding fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
