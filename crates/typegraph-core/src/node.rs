// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type node variants and per-node metadata.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ident::{MaterializerId, PolicyId, RuntimeId, TypeId};

/// Refinement formats carried by string scalars.
///
/// Formats influence scalar mapping in downstream schema generators (a
/// `DateTime` string maps to a date-time column, a `Uuid` string gains a
/// storage-specific type annotation) but are otherwise opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    /// RFC 4122 UUID.
    Uuid,
    /// RFC 3339 date-time.
    DateTime,
    /// Email address.
    Email,
    /// URI reference.
    Uri,
    /// Embedded JSON document.
    Json,
}

/// Injection source for a field whose value is supplied by the runtime
/// rather than the caller.
///
/// Injection descriptors are carried through serialization verbatim; their
/// semantics belong to the consuming engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "data", rename_all = "lowercase")]
pub enum Injection {
    /// A literal value baked into the graph.
    Static(Value),
    /// A value read from the request context under the given key.
    Context(String),
    /// A value read from a named secret.
    Secret(String),
    /// A value copied from the named field of the parent struct.
    Parent(String),
}

/// The closed set of type node variants.
///
/// All child references are [`TypeId`]s into the owning graph arena. The
/// variant set is deliberately closed: every traversal in the core
/// dispatches by exhaustive match, so adding a variant is a compile-visible
/// change at every walk site.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// Boolean scalar.
    Boolean,
    /// Integer scalar.
    Integer,
    /// Floating-point scalar.
    Float,
    /// String scalar with an optional refinement format.
    String {
        /// Refinement format, if any.
        format: Option<StringFormat>,
    },
    /// Optional wrapper around an inner type.
    Optional {
        /// The wrapped type.
        of: TypeId,
    },
    /// Array of an inner type.
    Array {
        /// The element type.
        of: TypeId,
    },
    /// Record type with named fields in declaration order.
    Struct {
        /// Field name to field type, declaration order preserved.
        fields: Vec<(String, TypeId)>,
    },
    /// Untagged union over the given variants.
    Union {
        /// Variant types in declaration order.
        variants: Vec<TypeId>,
    },
    /// Exclusive (exactly-one) union over the given variants.
    Either {
        /// Variant types in declaration order.
        variants: Vec<TypeId>,
    },
    /// Exposed operation: a typed input struct, an output type, and the
    /// materializer that executes it.
    Function {
        /// Input struct type.
        input: TypeId,
        /// Output type.
        output: TypeId,
        /// Capability descriptor for the executable behavior.
        materializer: MaterializerId,
    },
    /// Unresolved forward reference to a named node.
    Proxy {
        /// Name of the node this proxy stands for.
        target: String,
    },
}

impl TypeNode {
    /// Short kind label used for synthesized names and wire output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String { .. } => "string",
            Self::Optional { .. } => "optional",
            Self::Array { .. } => "array",
            Self::Struct { .. } => "struct",
            Self::Union { .. } => "union",
            Self::Either { .. } => "either",
            Self::Function { .. } => "function",
            Self::Proxy { .. } => "proxy",
        }
    }

    /// Returns true for the leaf scalar variants.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::Integer | Self::Float | Self::String { .. }
        )
    }
}

/// A node entry in the graph arena: the variant plus per-node metadata.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    /// Stable id, equal to this entry's arena slot.
    pub id: TypeId,
    /// Explicit name, if the node was named.
    pub name: Option<String>,
    /// The type variant.
    pub node: TypeNode,
    /// Open runtime-config bag (e.g. `{"id": true, "unique": true}`).
    ///
    /// `BTreeMap` so iteration (and therefore wire output) is deterministic.
    pub config: BTreeMap<String, Value>,
    /// Injection descriptor, if the node's value is runtime-supplied.
    pub injection: Option<Injection>,
    /// Policies attached to this node, in attachment order.
    pub policies: Vec<PolicyId>,
    /// Owning runtime. `None` until assigned explicitly or by propagation.
    pub runtime: Option<RuntimeId>,
}

impl NodeEntry {
    /// The node's display name: its explicit name, or `{kind}_{id}` when
    /// unnamed.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.node.kind(), self.id.0))
    }

    /// Reads a boolean flag from the config bag. Missing or non-boolean
    /// entries read as `false`.
    #[must_use]
    pub fn config_flag(&self, key: &str) -> bool {
        self.config.get(key).and_then(Value::as_bool) == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_kind_and_id() {
        let entry = NodeEntry {
            id: TypeId(4),
            name: None,
            node: TypeNode::Integer,
            config: BTreeMap::new(),
            injection: None,
            policies: vec![],
            runtime: None,
        };
        assert_eq!(entry.display_name(), "integer_4");
    }

    #[test]
    fn config_flag_reads_only_true_booleans() {
        let mut entry = NodeEntry {
            id: TypeId(0),
            name: None,
            node: TypeNode::Boolean,
            config: BTreeMap::new(),
            injection: None,
            policies: vec![],
            runtime: None,
        };
        assert!(!entry.config_flag("id"));
        entry
            .config
            .insert("id".to_owned(), Value::Bool(true));
        assert!(entry.config_flag("id"));
        entry
            .config
            .insert("unique".to_owned(), Value::String("yes".to_owned()));
        assert!(!entry.config_flag("unique"));
    }
}
