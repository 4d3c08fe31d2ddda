// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Link declaration: attaching relationship hints to a field's type.
//!
//! `link` allocates a reference node for the target and stores the hints in
//! the reference's config bag, so the original node (often shared between
//! several fields) is never contaminated and keeps its identity: the
//! resolver matches reciprocal fields by the node the reference resolves
//! to, not by the reference itself.
use serde_json::Value;
use typegraph_core::{GraphError, TypeGraph, TypeId};

/// Config-bag key holding the explicit relationship name.
pub(crate) const REL_NAME: &str = "rel_name";
/// Config-bag key holding the explicit target field name.
pub(crate) const REL_FIELD: &str = "rel_field";
/// Config-bag key holding the explicit foreign-key flag.
pub(crate) const REL_FKEY: &str = "rel_fkey";

/// Relationship hints a user script can pre-declare on a link field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSpec {
    /// Explicit relationship name; both sides carrying a name must agree.
    pub name: Option<String>,
    /// Explicit reciprocal field on the target struct, for disambiguation.
    pub field: Option<String>,
    /// Explicit foreign-key side: `Some(true)` claims ownership,
    /// `Some(false)` declines it.
    pub fkey: Option<bool>,
}

impl LinkSpec {
    /// A spec carrying only an explicit relationship name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the explicit target field.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Sets the explicit foreign-key flag.
    #[must_use]
    pub fn fkey(mut self, fkey: bool) -> Self {
        self.fkey = Some(fkey);
        self
    }
}

/// Allocates a reference to `target` carrying `spec`'s hints.
///
/// The returned id is what a struct field should reference. Works on
/// structs, quantified structs (`array(post)`), and proxies alike — the
/// hints ride on the reference, and the resolver reads them back through
/// one level of quantifier. The reference resolves to `target` itself, so
/// a field linked to a named struct is matched against that struct.
///
/// # Errors
/// Returns [`GraphError::UnknownId`] if `target` is not a node of `graph`.
pub fn link(graph: &mut TypeGraph, target: TypeId, spec: &LinkSpec) -> Result<TypeId, GraphError> {
    let id = graph.reference(target)?;
    if let Some(name) = &spec.name {
        graph.set_config(id, REL_NAME, Value::String(name.clone()))?;
    }
    if let Some(field) = &spec.field {
        graph.set_config(id, REL_FIELD, Value::String(field.clone()))?;
    }
    if let Some(fkey) = spec.fkey {
        graph.set_config(id, REL_FKEY, Value::Bool(fkey))?;
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn link_stores_hints_and_keeps_the_target_identity() {
        let mut g = TypeGraph::new();
        let s = g.struct_(vec![]);
        g.name(s, "Post").unwrap();
        let spec = LinkSpec::named("postAuthor").fkey(true);
        let linked = link(&mut g, s, &spec).unwrap();
        assert_ne!(linked, s);
        let entry = g.entry(linked).unwrap();
        assert_eq!(
            entry.config.get(REL_NAME),
            Some(&Value::String("postAuthor".to_owned()))
        );
        assert_eq!(entry.config.get(REL_FKEY), Some(&Value::Bool(true)));
        // The original is untouched, and the link resolves back to it.
        assert!(g.entry(s).unwrap().config.is_empty());
        assert_eq!(g.resolved(linked).unwrap(), s);
    }
}
