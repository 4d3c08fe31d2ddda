// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reachability collection: flattening the live graph into indexed tables.
//!
//! The collector walks depth-first from a root node and assigns each
//! distinct node the next unused index in its table the first time it is
//! seen. Types, materializers, runtimes, and policies each have an
//! independent index space. Two ordering rules make cycles safe and child
//! indices embeddable:
//!
//! 1. a node is memoized (index reserved) *before* its children are
//!    visited, so a cycle back to it returns the reserved index;
//! 2. a node's wire data is computed *after* all of its children are
//!    indexed, so the data can embed child indices directly.
use rustc_hash::FxHashMap;

use crate::error::SerializeError;
use crate::graph::TypeGraph;
use crate::ident::{MaterializerId, PolicyId, RuntimeId, TypeId};
use crate::node::TypeNode;
use crate::serialize::{WireMaterializer, WirePolicy, WireRuntime, WireType};

/// Per-serialization collection state: four append-only tables plus
/// id→index memos. Created at serialize time, discarded afterwards.
#[derive(Debug)]
pub struct Collector<'g> {
    graph: &'g TypeGraph,
    types: Vec<Option<WireType>>,
    type_index: FxHashMap<u32, u32>,
    materializers: Vec<Option<WireMaterializer>>,
    materializer_index: FxHashMap<u32, u32>,
    runtimes: Vec<Option<WireRuntime>>,
    runtime_index: FxHashMap<u32, u32>,
    policies: Vec<Option<WirePolicy>>,
    policy_index: FxHashMap<u32, u32>,
}

/// The four finished tables, ready to wrap into a document.
#[derive(Debug)]
pub struct Tables {
    /// Flattened types in first-visit order.
    pub types: Vec<WireType>,
    /// Flattened materializers in first-visit order.
    pub materializers: Vec<WireMaterializer>,
    /// Flattened runtimes in first-visit order.
    pub runtimes: Vec<WireRuntime>,
    /// Flattened policies in first-visit order.
    pub policies: Vec<WirePolicy>,
}

impl<'g> Collector<'g> {
    /// Creates a collector over `graph`.
    #[must_use]
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self {
            graph,
            types: Vec::new(),
            type_index: FxHashMap::default(),
            materializers: Vec::new(),
            materializer_index: FxHashMap::default(),
            runtimes: Vec::new(),
            runtime_index: FxHashMap::default(),
            policies: Vec::new(),
            policy_index: FxHashMap::default(),
        }
    }

    /// Collects the type reachable from `id`, returning its table index.
    ///
    /// Re-visiting an already-indexed node returns the previously assigned
    /// index without re-deriving its data.
    ///
    /// # Errors
    /// Returns [`SerializeError::UnassignedRuntime`] for a reachable node
    /// with no owning runtime, or a graph error for unresolved proxies.
    pub fn collect_type(&mut self, id: TypeId) -> Result<u32, SerializeError> {
        let concrete = self.graph.resolved(id)?;
        if let Some(&index) = self.type_index.get(&concrete.0) {
            return Ok(index);
        }
        let index = u32::try_from(self.types.len())
            .map_err(|_| SerializeError::Internal("type table overflow"))?;
        // Reserve the slot and memoize before recursing: cycles back to this
        // node must see its index.
        self.type_index.insert(concrete.0, index);
        self.types.push(None);

        let entry = self.graph.entry(concrete)?.clone();
        let runtime = entry
            .runtime
            .ok_or_else(|| SerializeError::UnassignedRuntime {
                node: entry.display_name(),
            })?;
        let runtime_index = self.collect_runtime(runtime)?;

        let mut wire = WireType::bare(entry.node.kind(), entry.display_name(), runtime_index);
        wire.config = entry.config.clone();
        wire.injection = entry.injection.clone();
        for policy in &entry.policies {
            let policy_index = self.collect_policy(*policy)?;
            wire.policies.push(policy_index);
        }

        match &entry.node {
            TypeNode::Boolean | TypeNode::Integer | TypeNode::Float => {}
            TypeNode::String { format } => {
                wire.format = *format;
            }
            TypeNode::Optional { of } | TypeNode::Array { of } => {
                wire.item = Some(self.collect_type(*of)?);
            }
            TypeNode::Struct { fields } => {
                let mut properties = Vec::with_capacity(fields.len());
                for (name, field) in fields {
                    properties.push((name.clone(), self.collect_type(*field)?));
                }
                wire.properties = Some(properties);
            }
            TypeNode::Union { variants } | TypeNode::Either { variants } => {
                let mut indexed = Vec::with_capacity(variants.len());
                for variant in variants {
                    indexed.push(self.collect_type(*variant)?);
                }
                wire.variants = Some(indexed);
            }
            TypeNode::Function {
                input,
                output,
                materializer,
            } => {
                wire.input = Some(self.collect_type(*input)?);
                wire.output = Some(self.collect_type(*output)?);
                wire.materializer = Some(self.collect_materializer(*materializer)?);
            }
            TypeNode::Proxy { target } => {
                // `resolved` above cannot return a proxy; reaching this arm
                // means the arena was mutated mid-collection.
                return Err(SerializeError::Graph(
                    crate::error::GraphError::UnknownReference {
                        name: target.clone(),
                    },
                ));
            }
        }

        self.types[index as usize] = Some(wire);
        Ok(index)
    }

    fn collect_runtime(&mut self, id: RuntimeId) -> Result<u32, SerializeError> {
        if let Some(&index) = self.runtime_index.get(&id.0) {
            return Ok(index);
        }
        let runtime = self.graph.runtime(id)?;
        let index = u32::try_from(self.runtimes.len())
            .map_err(|_| SerializeError::Internal("runtime table overflow"))?;
        self.runtime_index.insert(id.0, index);
        self.runtimes.push(Some(WireRuntime {
            name: runtime.name.clone(),
            data: runtime.data.clone(),
        }));
        Ok(index)
    }

    fn collect_materializer(&mut self, id: MaterializerId) -> Result<u32, SerializeError> {
        if let Some(&index) = self.materializer_index.get(&id.0) {
            return Ok(index);
        }
        let materializer = self.graph.materializer(id)?.clone();
        let index = u32::try_from(self.materializers.len())
            .map_err(|_| SerializeError::Internal("materializer table overflow"))?;
        self.materializer_index.insert(id.0, index);
        self.materializers.push(None);
        let runtime_index = self.collect_runtime(materializer.runtime)?;
        self.materializers[index as usize] = Some(WireMaterializer {
            name: materializer.name,
            runtime: runtime_index,
            data: materializer.data,
        });
        Ok(index)
    }

    fn collect_policy(&mut self, id: PolicyId) -> Result<u32, SerializeError> {
        if let Some(&index) = self.policy_index.get(&id.0) {
            return Ok(index);
        }
        let policy = self.graph.policy(id)?.clone();
        let index = u32::try_from(self.policies.len())
            .map_err(|_| SerializeError::Internal("policy table overflow"))?;
        self.policy_index.insert(id.0, index);
        self.policies.push(None);
        let materializer_index = self.collect_materializer(policy.materializer)?;
        self.policies[index as usize] = Some(WirePolicy {
            name: policy.name,
            materializer: materializer_index,
        });
        Ok(index)
    }

    /// Converts the collector into its finished tables.
    ///
    /// # Errors
    /// Returns [`SerializeError::Internal`] if any reserved slot was never
    /// filled; that indicates a bug in the collection walk, not user input.
    pub fn finish(self) -> Result<Tables, SerializeError> {
        fn drain<T>(slots: Vec<Option<T>>, what: &'static str) -> Result<Vec<T>, SerializeError> {
            slots
                .into_iter()
                .map(|slot| slot.ok_or(SerializeError::Internal(what)))
                .collect()
        }
        Ok(Tables {
            types: drain(self.types, "uncomputed type slot")?,
            materializers: drain(self.materializers, "uncomputed materializer slot")?,
            runtimes: drain(self.runtimes, "uncomputed runtime slot")?,
            policies: drain(self.policies, "uncomputed policy slot")?,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::runtime::Runtime;

    #[test]
    fn revisiting_an_indexed_node_returns_the_same_index() {
        let mut g = TypeGraph::new();
        let rt = g.add_runtime(Runtime::new("prisma"));
        let i = g.integer();
        let s = g.struct_(vec![("a".to_owned(), i), ("b".to_owned(), i)]);
        crate::propagate::propagate_runtimes(&mut g, s, Some(rt)).unwrap();

        let mut collector = Collector::new(&g);
        let root = collector.collect_type(s).unwrap();
        let again = collector.collect_type(s).unwrap();
        assert_eq!(root, again);
        let tables = collector.finish().unwrap();
        // The shared integer is emitted once: struct + integer.
        assert_eq!(tables.types.len(), 2);
        let properties = tables.types[root as usize].properties.as_ref().unwrap();
        assert_eq!(properties[0].1, properties[1].1);
    }

    #[test]
    fn self_referential_struct_collects_without_duplicates() {
        let mut g = TypeGraph::new();
        let rt = g.add_runtime(Runtime::new("prisma"));
        let p = g.proxy("Node");
        let children = g.array(p).unwrap();
        let s = g.struct_(vec![("children".to_owned(), children)]);
        g.name(s, "Node").unwrap();
        g.resolve_proxies().unwrap();
        crate::propagate::propagate_runtimes(&mut g, s, Some(rt)).unwrap();

        let mut collector = Collector::new(&g);
        let root = collector.collect_type(s).unwrap();
        let tables = collector.finish().unwrap();
        assert_eq!(tables.types.len(), 2); // Node + children array
        let array_index = tables.types[root as usize].properties.as_ref().unwrap()[0].1;
        assert_eq!(tables.types[array_index as usize].item, Some(root));
    }

    #[test]
    fn unassigned_runtime_is_fatal() {
        let mut g = TypeGraph::new();
        let i = g.integer();
        let s = g.struct_(vec![("n".to_owned(), i)]);
        let mut collector = Collector::new(&g);
        let err = collector.collect_type(s).unwrap_err();
        assert!(matches!(err, SerializeError::UnassignedRuntime { node } if node == "struct_1"));
    }
}
