// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The type graph arena and its construction primitives.
//!
//! A [`TypeGraph`] is an explicit build context: all construction happens
//! through a `&mut TypeGraph`, so two concurrent builds can never interleave
//! against shared ambient state — each build owns its graph. Nested imports
//! simply construct their own child `TypeGraph`.
//!
//! Construction is two-phase with respect to forward references: phase one
//! allocates nodes freely, recording [`TypeNode::Proxy`] placeholders for
//! names that may not exist yet; phase two ([`TypeGraph::resolve_proxies`])
//! resolves every proxy against the name table in one pass, reporting all
//! dangling names together.
use std::collections::BTreeMap;
use std::fmt::Write;

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;

use crate::error::GraphError;
use crate::ident::{MaterializerId, PolicyId, RuntimeId, TypeId};
use crate::node::{Injection, NodeEntry, StringFormat, TypeNode};
use crate::runtime::{Materializer, Policy, Runtime};

/// Arena of type nodes plus the descriptor registries for one graph build.
///
/// Ids are arena indices: the node with `TypeId(n)` lives in slot `n`,
/// assigned once and never reused. The graph is created fresh per build and
/// discarded after serialization.
#[derive(Debug, Default)]
pub struct TypeGraph {
    nodes: Vec<NodeEntry>,
    names: FxHashMap<String, TypeId>,
    /// Proxy id -> concrete target id, filled by [`Self::resolve_proxies`].
    proxy_targets: FxHashMap<u32, TypeId>,
    runtimes: Vec<Runtime>,
    materializers: Vec<Materializer>,
    policies: Vec<Policy>,
}

impl TypeGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated type nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no nodes have been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Next arena index for a table of `len` entries.
    ///
    /// Index spaces are `u32`; a build exhausts memory long before 2^32
    /// entries, so overflow here is a runaway builder, not valid input.
    fn next_index(len: usize) -> u32 {
        match u32::try_from(len) {
            Ok(raw) => raw,
            Err(_) => unreachable!("arena index space exhausted"),
        }
    }

    fn alloc(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(Self::next_index(self.nodes.len()));
        self.nodes.push(NodeEntry {
            id,
            name: None,
            node,
            config: BTreeMap::new(),
            injection: None,
            policies: Vec::new(),
            runtime: None,
        });
        id
    }

    // ─── Construction primitives ─────────────────────────────────────────

    /// Allocates a boolean scalar.
    pub fn boolean(&mut self) -> TypeId {
        self.alloc(TypeNode::Boolean)
    }

    /// Allocates an integer scalar.
    pub fn integer(&mut self) -> TypeId {
        self.alloc(TypeNode::Integer)
    }

    /// Allocates a float scalar.
    pub fn float(&mut self) -> TypeId {
        self.alloc(TypeNode::Float)
    }

    /// Allocates a string scalar with an optional refinement format.
    pub fn string(&mut self, format: Option<StringFormat>) -> TypeId {
        self.alloc(TypeNode::String { format })
    }

    /// Wraps `of` in an optional.
    ///
    /// Idempotent: wrapping a node that is already an `Optional` returns the
    /// node unchanged rather than nesting.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] if `of` is not a node of this graph.
    pub fn optional(&mut self, of: TypeId) -> Result<TypeId, GraphError> {
        if matches!(self.entry(of)?.node, TypeNode::Optional { .. }) {
            return Ok(of);
        }
        Ok(self.alloc(TypeNode::Optional { of }))
    }

    /// Wraps `of` in an array.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] if `of` is not a node of this graph.
    pub fn array(&mut self, of: TypeId) -> Result<TypeId, GraphError> {
        self.entry(of)?;
        Ok(self.alloc(TypeNode::Array { of }))
    }

    /// Allocates a struct with the given fields, declaration order preserved.
    pub fn struct_(&mut self, fields: Vec<(String, TypeId)>) -> TypeId {
        self.alloc(TypeNode::Struct { fields })
    }

    /// Allocates an untagged union over `variants`.
    pub fn union(&mut self, variants: Vec<TypeId>) -> TypeId {
        self.alloc(TypeNode::Union { variants })
    }

    /// Allocates an exclusive union over `variants`.
    pub fn either(&mut self, variants: Vec<TypeId>) -> TypeId {
        self.alloc(TypeNode::Either { variants })
    }

    /// Allocates a function node.
    pub fn func(&mut self, input: TypeId, output: TypeId, materializer: MaterializerId) -> TypeId {
        self.alloc(TypeNode::Function {
            input,
            output,
            materializer,
        })
    }

    /// Allocates a forward reference to the node named `target`.
    ///
    /// A proxy never allocates (or requires) a concrete target at creation
    /// time; construction is order-independent as long as the target exists
    /// by the time [`Self::resolve_proxies`] runs.
    pub fn proxy(&mut self, target: impl Into<String>) -> TypeId {
        self.alloc(TypeNode::Proxy {
            target: target.into(),
        })
    }

    // ─── Node access ─────────────────────────────────────────────────────

    /// Returns the entry for `id`.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] if `id` is not a node of this graph.
    pub fn entry(&self, id: TypeId) -> Result<&NodeEntry, GraphError> {
        self.nodes
            .get(id.index())
            .ok_or(GraphError::UnknownId { id: id.0 })
    }

    fn entry_mut(&mut self, id: TypeId) -> Result<&mut NodeEntry, GraphError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownId { id: id.0 })
    }

    /// Looks up a node by explicit name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Sets the explicit name of a node.
    ///
    /// Renaming a node frees its previous name. Naming is first-come: a name
    /// already claimed by a different node is rejected.
    ///
    /// # Errors
    /// Returns [`GraphError::DuplicateName`] if a different node already
    /// holds `name`, or [`GraphError::UnknownId`] for a bad id.
    pub fn name(&mut self, id: TypeId, name: impl Into<String>) -> Result<(), GraphError> {
        let name = name.into();
        match self.names.get(&name) {
            Some(&existing) if existing != id => {
                return Err(GraphError::DuplicateName { name });
            }
            _ => {}
        }
        let previous = {
            let entry = self.entry_mut(id)?;
            entry.name.replace(name.clone())
        };
        if let Some(previous) = previous {
            self.names.remove(&previous);
        }
        self.names.insert(name, id);
        Ok(())
    }

    /// Sets one key of the node's runtime-config bag.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] for a bad id.
    pub fn set_config(
        &mut self,
        id: TypeId,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), GraphError> {
        self.entry_mut(id)?.config.insert(key.into(), value);
        Ok(())
    }

    /// Sets the node's injection descriptor.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] for a bad id.
    pub fn inject(&mut self, id: TypeId, injection: Injection) -> Result<(), GraphError> {
        self.entry_mut(id)?.injection = Some(injection);
        Ok(())
    }

    /// Appends a policy to the node's policy chain.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] for a bad id.
    pub fn attach_policy(&mut self, id: TypeId, policy: PolicyId) -> Result<(), GraphError> {
        self.entry_mut(id)?.policies.push(policy);
        Ok(())
    }

    /// Explicitly assigns the node's owning runtime.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] for a bad id.
    pub fn set_runtime(&mut self, id: TypeId, runtime: RuntimeId) -> Result<(), GraphError> {
        self.entry_mut(id)?.runtime = Some(runtime);
        Ok(())
    }

    pub(crate) fn set_runtime_if_unset(&mut self, id: TypeId, runtime: RuntimeId) {
        if let Some(entry) = self.nodes.get_mut(id.index()) {
            if entry.runtime.is_none() {
                entry.runtime = Some(runtime);
            }
        }
    }

    /// Clones a node into a fresh arena slot, returning the copy's id.
    ///
    /// Fluent modifiers are mutation-via-copy: the copy shares no state with
    /// the original and starts unnamed (names are unique, they do not travel
    /// with copies). A copy of a resolved proxy keeps its resolution.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] for a bad id.
    pub fn clone_into_slot(&mut self, id: TypeId) -> Result<TypeId, GraphError> {
        let mut entry = self.entry(id)?.clone();
        let new_id = TypeId(Self::next_index(self.nodes.len()));
        entry.id = new_id;
        entry.name = None;
        self.nodes.push(entry);
        if let Some(&target) = self.proxy_targets.get(&id.0) {
            self.proxy_targets.insert(new_id.0, target);
        }
        Ok(new_id)
    }

    /// Allocates an indirection node resolving to `id`.
    ///
    /// Unlike [`Self::clone_into_slot`], a reference preserves identity:
    /// [`Self::resolved`] follows it to `id` itself, so identity-sensitive
    /// consumers (relationship matching, the collector) see the original
    /// node, while metadata set on the reference stays on the reference.
    /// Referencing an unresolved proxy yields a copy of that proxy, resolved
    /// by name in the next [`Self::resolve_proxies`] pass.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] if `id` is not a node of this graph.
    pub fn reference(&mut self, id: TypeId) -> Result<TypeId, GraphError> {
        let entry = self.entry(id)?;
        let (target_name, resolution) = match &entry.node {
            TypeNode::Proxy { target } => {
                (target.clone(), self.proxy_targets.get(&id.0).copied())
            }
            _ => (entry.display_name(), Some(id)),
        };
        let new_id = self.alloc(TypeNode::Proxy {
            target: target_name,
        });
        if let Some(resolution) = resolution {
            self.proxy_targets.insert(new_id.0, resolution);
        }
        Ok(new_id)
    }

    // ─── Proxy resolution ────────────────────────────────────────────────

    /// Resolves every proxy against the name table.
    ///
    /// Runs in one pass and is idempotent; call again after allocating more
    /// proxies. Unresolved names are collected and reported together.
    ///
    /// # Errors
    /// Returns [`GraphError::UnresolvedProxies`] listing every proxy target
    /// that has no named node, in allocation order.
    pub fn resolve_proxies(&mut self) -> Result<(), GraphError> {
        let mut unresolved = Vec::new();
        for slot in 0..self.nodes.len() {
            let TypeNode::Proxy { ref target } = self.nodes[slot].node else {
                continue;
            };
            // References created by id are already resolved.
            if self.proxy_targets.contains_key(&self.nodes[slot].id.0) {
                continue;
            }
            match self.names.get(target) {
                Some(&id) => {
                    self.proxy_targets.insert(self.nodes[slot].id.0, id);
                }
                None => unresolved.push(target.clone()),
            }
        }
        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(GraphError::UnresolvedProxies { names: unresolved })
        }
    }

    /// Follows proxy indirection from `id` to a concrete node id.
    ///
    /// Non-proxy nodes resolve to themselves. Proxy chains (a proxy naming a
    /// node that is itself a proxy) are followed transitively; a chain that
    /// never reaches a concrete node is treated as unresolved.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownReference`] if a proxy on the path has
    /// not been resolved, or [`GraphError::UnknownId`] for a bad id.
    pub fn resolved(&self, id: TypeId) -> Result<TypeId, GraphError> {
        let mut current = id;
        // Bounded by the node count: any longer walk is a proxy cycle.
        for _ in 0..=self.nodes.len() {
            let entry = self.entry(current)?;
            let TypeNode::Proxy { ref target } = entry.node else {
                return Ok(current);
            };
            match self.proxy_targets.get(&current.0) {
                Some(&next) => current = next,
                None => {
                    return Err(GraphError::UnknownReference {
                        name: target.clone(),
                    })
                }
            }
        }
        let entry = self.entry(current)?;
        Err(GraphError::UnknownReference {
            name: entry.display_name(),
        })
    }

    /// Returns the entry `id` resolves to, following proxies.
    ///
    /// # Errors
    /// Same as [`Self::resolved`].
    pub fn resolved_entry(&self, id: TypeId) -> Result<&NodeEntry, GraphError> {
        let concrete = self.resolved(id)?;
        self.entry(concrete)
    }

    /// Renders a compact textual description of the type at `id`, for
    /// diagnostics and error messages.
    ///
    /// Proxies are followed when resolved and rendered as `proxy(name)`
    /// otherwise. A node revisited on the current path renders as its
    /// display name, so cyclic graphs terminate.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] for a bad id.
    pub fn repr(&self, id: TypeId) -> Result<String, GraphError> {
        let mut out = String::new();
        let mut on_path = FxHashSet::default();
        self.repr_into(id, &mut on_path, &mut out)?;
        Ok(out)
    }

    fn repr_into(
        &self,
        id: TypeId,
        on_path: &mut FxHashSet<u32>,
        out: &mut String,
    ) -> Result<(), GraphError> {
        let entry = self.entry(id)?;
        if let TypeNode::Proxy { ref target } = entry.node {
            return match self.proxy_targets.get(&id.0) {
                Some(&next) => self.repr_into(next, on_path, out),
                None => {
                    out.push_str("proxy(");
                    out.push_str(target);
                    out.push(')');
                    Ok(())
                }
            };
        }
        if !on_path.insert(id.0) {
            out.push_str(&entry.display_name());
            return Ok(());
        }
        match &entry.node {
            TypeNode::Boolean | TypeNode::Integer | TypeNode::Float => {
                out.push_str(entry.node.kind());
            }
            TypeNode::String { format } => {
                out.push_str("string");
                if let Some(format) = format {
                    let _ = write!(out, "({format:?})");
                }
            }
            TypeNode::Optional { of } => {
                out.push_str("optional(");
                self.repr_into(*of, on_path, out)?;
                out.push(')');
            }
            TypeNode::Array { of } => {
                out.push_str("array(");
                self.repr_into(*of, on_path, out)?;
                out.push(')');
            }
            TypeNode::Struct { fields } => {
                out.push_str("struct ");
                out.push_str(&entry.display_name());
                out.push_str(" {");
                for (i, (name, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push(' ');
                    out.push_str(name);
                    out.push_str(": ");
                    self.repr_into(*field, on_path, out)?;
                }
                out.push_str(" }");
            }
            TypeNode::Union { variants } | TypeNode::Either { variants } => {
                out.push_str(entry.node.kind());
                out.push('(');
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" | ");
                    }
                    self.repr_into(*variant, on_path, out)?;
                }
                out.push(')');
            }
            TypeNode::Function { input, output, .. } => {
                out.push_str("func(");
                self.repr_into(*input, on_path, out)?;
                out.push_str(" -> ");
                self.repr_into(*output, on_path, out)?;
                out.push(')');
            }
            TypeNode::Proxy { .. } => {}
        }
        on_path.remove(&id.0);
        Ok(())
    }

    // ─── Descriptor registries ───────────────────────────────────────────

    /// Registers a runtime descriptor.
    pub fn add_runtime(&mut self, runtime: Runtime) -> RuntimeId {
        let id = RuntimeId(Self::next_index(self.runtimes.len()));
        self.runtimes.push(runtime);
        id
    }

    /// Registers a materializer descriptor.
    pub fn add_materializer(&mut self, materializer: Materializer) -> MaterializerId {
        let id = MaterializerId(Self::next_index(self.materializers.len()));
        self.materializers.push(materializer);
        id
    }

    /// Registers a policy descriptor.
    pub fn add_policy(&mut self, policy: Policy) -> PolicyId {
        let id = PolicyId(Self::next_index(self.policies.len()));
        self.policies.push(policy);
        id
    }

    /// Returns the runtime descriptor for `id`.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] for a bad id.
    pub fn runtime(&self, id: RuntimeId) -> Result<&Runtime, GraphError> {
        self.runtimes
            .get(id.index())
            .ok_or(GraphError::UnknownId { id: id.0 })
    }

    /// Returns the materializer descriptor for `id`.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] for a bad id.
    pub fn materializer(&self, id: MaterializerId) -> Result<&Materializer, GraphError> {
        self.materializers
            .get(id.index())
            .ok_or(GraphError::UnknownId { id: id.0 })
    }

    /// Returns the policy descriptor for `id`.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownId`] for a bad id.
    pub fn policy(&self, id: PolicyId) -> Result<&Policy, GraphError> {
        self.policies
            .get(id.index())
            .ok_or(GraphError::UnknownId { id: id.0 })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn optional_collapses_instead_of_nesting() {
        let mut g = TypeGraph::new();
        let i = g.integer();
        let opt = g.optional(i).unwrap();
        let opt2 = g.optional(opt).unwrap();
        assert_eq!(opt, opt2);
        assert!(matches!(
            g.entry(opt2).unwrap().node,
            TypeNode::Optional { of } if of == i
        ));
    }

    #[test]
    fn duplicate_name_rejected_for_distinct_nodes() {
        let mut g = TypeGraph::new();
        let a = g.integer();
        let b = g.boolean();
        g.name(a, "value").unwrap();
        // Re-naming the same node with the same name is fine.
        g.name(a, "value").unwrap();
        assert_eq!(
            g.name(b, "value"),
            Err(GraphError::DuplicateName {
                name: "value".to_owned()
            })
        );
    }

    #[test]
    fn renaming_frees_the_previous_name() {
        let mut g = TypeGraph::new();
        let a = g.integer();
        let b = g.boolean();
        g.name(a, "first").unwrap();
        g.name(a, "second").unwrap();
        g.name(b, "first").unwrap();
        assert_eq!(g.lookup("first"), Some(b));
        assert_eq!(g.lookup("second"), Some(a));
    }

    #[test]
    fn resolve_proxies_reports_all_dangling_names_at_once() {
        let mut g = TypeGraph::new();
        let _a = g.proxy("Missing1");
        let s = g.struct_(vec![]);
        g.name(s, "Present").unwrap();
        let _b = g.proxy("Present");
        let _c = g.proxy("Missing2");
        assert_eq!(
            g.resolve_proxies(),
            Err(GraphError::UnresolvedProxies {
                names: vec!["Missing1".to_owned(), "Missing2".to_owned()]
            })
        );
    }

    #[test]
    fn proxy_resolution_is_order_independent() {
        let mut g = TypeGraph::new();
        // Proxy declared before its target.
        let p = g.proxy("Late");
        let s = g.struct_(vec![]);
        g.name(s, "Late").unwrap();
        g.resolve_proxies().unwrap();
        assert_eq!(g.resolved(p).unwrap(), s);
    }

    #[test]
    fn unresolved_proxy_dereference_fails() {
        let mut g = TypeGraph::new();
        let p = g.proxy("Nowhere");
        assert_eq!(
            g.resolved(p),
            Err(GraphError::UnknownReference {
                name: "Nowhere".to_owned()
            })
        );
    }

    #[test]
    fn proxy_chains_resolve_transitively() {
        let mut g = TypeGraph::new();
        let s = g.struct_(vec![]);
        g.name(s, "Concrete").unwrap();
        let inner = g.proxy("Concrete");
        g.name(inner, "Alias").unwrap();
        let outer = g.proxy("Alias");
        g.resolve_proxies().unwrap();
        assert_eq!(g.resolved(outer).unwrap(), s);
    }

    #[test]
    fn clone_into_slot_copies_state_but_not_the_name() {
        let mut g = TypeGraph::new();
        let s = g.struct_(vec![]);
        g.name(s, "Model").unwrap();
        g.set_config(s, "id", Value::Bool(true)).unwrap();
        let copy = g.clone_into_slot(s).unwrap();
        assert_ne!(copy, s);
        let entry = g.entry(copy).unwrap();
        assert_eq!(entry.name, None);
        assert!(entry.config_flag("id"));
        assert_eq!(g.lookup("Model"), Some(s));
    }

    #[test]
    fn reference_preserves_identity_without_a_name() {
        let mut g = TypeGraph::new();
        let s = g.struct_(vec![]);
        let r = g.reference(s).unwrap();
        assert_ne!(r, s);
        assert_eq!(g.resolved(r).unwrap(), s);
        // Metadata stays on the reference, not the referent.
        g.set_config(r, "id", Value::Bool(true)).unwrap();
        assert!(g.entry(s).unwrap().config.is_empty());
        // The name-table pass leaves id-resolved references alone.
        g.resolve_proxies().unwrap();
        assert_eq!(g.resolved(r).unwrap(), s);
    }

    #[test]
    fn reference_to_a_proxy_resolves_with_the_name_table() {
        let mut g = TypeGraph::new();
        let p = g.proxy("Late");
        let r = g.reference(p).unwrap();
        let s = g.struct_(vec![]);
        g.name(s, "Late").unwrap();
        g.resolve_proxies().unwrap();
        assert_eq!(g.resolved(r).unwrap(), s);
    }

    #[test]
    fn repr_renders_nested_types_and_terminates_on_cycles() {
        let mut g = TypeGraph::new();
        let id = g.integer();
        let parent_ref = g.proxy("Tree");
        let parent = g.optional(parent_ref).unwrap();
        let tree = g.struct_(vec![
            ("id".to_owned(), id),
            ("parent".to_owned(), parent),
        ]);
        g.name(tree, "Tree").unwrap();
        g.resolve_proxies().unwrap();
        assert_eq!(
            g.repr(tree).unwrap(),
            "struct Tree { id: integer, parent: optional(Tree) }"
        );
    }

    #[test]
    fn repr_marks_unresolved_proxies() {
        let mut g = TypeGraph::new();
        let p = g.proxy("Later");
        let arr = g.array(p).unwrap();
        assert_eq!(g.repr(arr).unwrap(), "array(proxy(Later))");
    }

    #[test]
    fn clone_of_resolved_proxy_keeps_its_resolution() {
        let mut g = TypeGraph::new();
        let s = g.struct_(vec![]);
        g.name(s, "Target").unwrap();
        let p = g.proxy("Target");
        g.resolve_proxies().unwrap();
        let copy = g.clone_into_slot(p).unwrap();
        assert_eq!(g.resolved(copy).unwrap(), s);
    }
}
