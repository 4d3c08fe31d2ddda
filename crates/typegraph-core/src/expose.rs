// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Top-level build entrypoint: expose operations and serialize the graph.
use serde_json::Value;

use crate::collect::Collector;
use crate::error::SerializeError;
use crate::graph::TypeGraph;
use crate::ident::{RuntimeId, TypeId};
use crate::node::TypeNode;
use crate::propagate::propagate_runtimes;
use crate::serialize::{Meta, TypegraphDoc, FORMAT_VERSION};

/// Build parameters for one typegraph serialization.
///
/// `auth`, `rate`, and `cors` are opaque pass-through data for the consuming
/// engine; the core only carries them into [`Meta`].
#[derive(Debug, Clone, Default)]
pub struct TypegraphParams {
    /// Graph name; becomes the synthetic root struct's name.
    pub name: String,
    /// Declared auth providers.
    pub auth: Vec<Value>,
    /// Rate-limit configuration.
    pub rate: Option<Value>,
    /// CORS configuration.
    pub cors: Option<Value>,
    /// Runtime inherited by nodes with no runtime of their own. Without it,
    /// any reachable node left unowned after propagation fails the build.
    pub default_runtime: Option<RuntimeId>,
}

impl TypegraphParams {
    /// Creates parameters with the given graph name and no extras.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Builds the synthetic root struct from `operations`, resolves proxies,
/// propagates runtimes, and flattens everything reachable into the wire
/// document.
///
/// This is the single top-level build call: the graph either fully resolves
/// and serializes, or the build fails outright — there is no partial
/// success.
///
/// # Errors
/// - [`SerializeError::Graph`] for unresolved proxies or name clashes with
///   the root name.
/// - [`SerializeError::InvalidExpose`] if an operation is not a function.
/// - [`SerializeError::UnassignedRuntime`] if a reachable node has no
///   owning runtime after propagation.
pub fn expose(
    graph: &mut TypeGraph,
    params: &TypegraphParams,
    operations: Vec<(String, TypeId)>,
) -> Result<TypegraphDoc, SerializeError> {
    graph.resolve_proxies()?;

    for (name, id) in &operations {
        let entry = graph.resolved_entry(*id)?;
        if !matches!(entry.node, TypeNode::Function { .. }) {
            return Err(SerializeError::InvalidExpose { name: name.clone() });
        }
    }

    let root = graph.struct_(operations);
    graph.name(root, params.name.clone())?;
    propagate_runtimes(graph, root, params.default_runtime)?;

    let mut collector = Collector::new(graph);
    let root_index = collector.collect_type(root)?;
    let tables = collector.finish()?;

    Ok(TypegraphDoc {
        types: tables.types,
        materializers: tables.materializers,
        runtimes: tables.runtimes,
        policies: tables.policies,
        meta: Meta {
            version: FORMAT_VERSION.to_owned(),
            auth: params.auth.clone(),
            rate: params.rate.clone(),
            cors: params.cors.clone(),
        },
        root: root_index,
    })
}
