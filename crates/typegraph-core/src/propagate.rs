// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime ownership propagation.
//!
//! Before collection, every reachable node must know which runtime owns it.
//! Ownership flows downward: a node with an explicit runtime keeps it and
//! becomes the inherited runtime for its children; a function node always
//! takes its materializer's runtime. Nodes that end the pass without a
//! runtime are reported by the collector as
//! [`SerializeError::UnassignedRuntime`](crate::error::SerializeError::UnassignedRuntime).
use rustc_hash::FxHashSet;

use crate::error::GraphError;
use crate::graph::TypeGraph;
use crate::ident::{RuntimeId, TypeId};
use crate::node::TypeNode;

/// Propagates runtime ownership downward from `root`.
///
/// `inherited` seeds the root (typically `None`: the synthetic root struct
/// owns nothing itself, its function children each bring their
/// materializer's runtime). The walk is iterative and memoizes visited node
/// ids, so cyclic graphs (self-referential structs via proxies) terminate.
///
/// # Errors
/// Returns a [`GraphError`] if the walk dereferences an unresolved proxy or
/// an unknown id. Missing runtimes are not an error here; they surface at
/// collection time with the node's name attached.
pub fn propagate_runtimes(
    graph: &mut TypeGraph,
    root: TypeId,
    inherited: Option<RuntimeId>,
) -> Result<(), GraphError> {
    let mut visited: FxHashSet<u32> = FxHashSet::default();
    let mut stack: Vec<(TypeId, Option<RuntimeId>)> = vec![(root, inherited)];

    while let Some((id, inherited)) = stack.pop() {
        let concrete = graph.resolved(id)?;
        if !visited.insert(concrete.0) {
            continue;
        }

        let entry = graph.entry(concrete)?;
        // A function's runtime is its materializer's; everything else takes
        // the nearest ancestor's runtime unless explicitly assigned.
        let own = match entry.node {
            TypeNode::Function { materializer, .. } => {
                Some(graph.materializer(materializer)?.runtime)
            }
            _ => entry.runtime.or(inherited),
        };
        if let Some(runtime) = own {
            graph.set_runtime_if_unset(concrete, runtime);
        }
        let assigned = graph.entry(concrete)?.runtime;

        match &graph.entry(concrete)?.node {
            TypeNode::Boolean | TypeNode::Integer | TypeNode::Float | TypeNode::String { .. } => {}
            TypeNode::Optional { of } | TypeNode::Array { of } => {
                stack.push((*of, assigned));
            }
            TypeNode::Struct { fields } => {
                for (_, field) in fields {
                    stack.push((*field, assigned));
                }
            }
            TypeNode::Union { variants } | TypeNode::Either { variants } => {
                for variant in variants {
                    stack.push((*variant, assigned));
                }
            }
            TypeNode::Function { input, output, .. } => {
                stack.push((*input, assigned));
                stack.push((*output, assigned));
            }
            // `resolved` above guarantees `concrete` is not a proxy.
            TypeNode::Proxy { .. } => {}
        }
    }
    Ok(())
}
