// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relationship inference.
//!
//! [`manage`] scans a struct's fields for links to other structs, pairs
//! each link with its reciprocal field on the target (by resolved node
//! identity, not name), validates explicit hints, selects the foreign-key
//! owner, and records the result in the [`Registry`]. Linked structs are
//! then managed recursively, so managing any member resolves its whole
//! connected component.
use serde_json::Value;
use tracing::debug;
use typegraph_core::{NodeEntry, TypeGraph, TypeId, TypeNode};

use crate::error::RelationError;
use crate::link::{REL_FIELD, REL_FKEY, REL_NAME};
use crate::registry::Registry;
use crate::relationship::{Cardinality, Relationship, RelationshipSide};

/// Explicit hints read back from a link field's config bag.
#[derive(Debug, Clone, Default)]
pub(crate) struct Hints {
    pub(crate) name: Option<String>,
    pub(crate) field: Option<String>,
    pub(crate) fkey: Option<bool>,
}

impl Hints {
    fn from_entry(entry: &NodeEntry) -> Self {
        Self {
            name: entry
                .config
                .get(REL_NAME)
                .and_then(Value::as_str)
                .map(str::to_owned),
            field: entry
                .config
                .get(REL_FIELD)
                .and_then(Value::as_str)
                .map(str::to_owned),
            fkey: entry.config.get(REL_FKEY).and_then(Value::as_bool),
        }
    }

    /// Merges hints found on the quantifier node with hints found one level
    /// in. Missing slots fill from `inner`; the target-field hint prefers
    /// the outer declaration.
    ///
    /// # Errors
    /// A name or foreign-key flag declared on both nodes with different
    /// values is rejected, same as a disagreement across the two sides.
    fn merge(self, inner: Self, model: &str, field: &str) -> Result<Self, RelationError> {
        let name = match (self.name, inner.name) {
            (Some(outer_name), Some(inner_name)) if outer_name != inner_name => {
                return Err(RelationError::InconsistentName {
                    left: outer_name,
                    right: inner_name,
                });
            }
            (outer_name, inner_name) => outer_name.or(inner_name),
        };
        let fkey = match (self.fkey, inner.fkey) {
            (Some(outer_fkey), Some(inner_fkey)) if outer_fkey != inner_fkey => {
                return Err(RelationError::ConflictingForeignKey {
                    left_model: model.to_owned(),
                    left_field: field.to_owned(),
                    right_model: model.to_owned(),
                    right_field: field.to_owned(),
                });
            }
            (outer_fkey, inner_fkey) => outer_fkey.or(inner_fkey),
        };
        Ok(Self {
            name,
            field: self.field.or(inner.field),
            fkey,
        })
    }
}

/// A field's classification: its cardinality toward whatever it points at,
/// the concrete node it points at (proxies followed, at most one quantifier
/// unwrapped), and any link hints found along the way.
#[derive(Debug, Clone)]
pub(crate) struct FieldShape {
    pub(crate) cardinality: Cardinality,
    pub(crate) target: TypeId,
    pub(crate) hints: Hints,
}

/// Classifies one field. Hints are gathered from the field's own node and,
/// when the field is quantified, from the node one level in — `link` may
/// have wrapped either (`link(array(post))` vs `array(link(post))`).
///
/// # Errors
/// Returns [`RelationError::NestedQuantifier`] when quantifiers nest, the
/// merge errors for hints that disagree between the two nodes, or a graph
/// error for unresolved proxies.
pub(crate) fn field_shape(
    graph: &TypeGraph,
    model: &str,
    field: &str,
    ty: TypeId,
) -> Result<FieldShape, RelationError> {
    let raw = graph.entry(ty)?;
    let mut hints = Hints::from_entry(raw);
    let outer = graph.resolved_entry(ty)?;

    let (cardinality, inner) = match &outer.node {
        TypeNode::Optional { of } => (Cardinality::Optional, Some(*of)),
        TypeNode::Array { of } => (Cardinality::Many, Some(*of)),
        _ => (Cardinality::One, None),
    };

    let target = match inner {
        Some(of) => {
            hints = hints.merge(Hints::from_entry(graph.entry(of)?), model, field)?;
            let inner_entry = graph.resolved_entry(of)?;
            if matches!(
                inner_entry.node,
                TypeNode::Optional { .. } | TypeNode::Array { .. }
            ) {
                return Err(RelationError::NestedQuantifier {
                    model: model.to_owned(),
                    field: field.to_owned(),
                });
            }
            inner_entry.id
        }
        None => outer.id,
    };

    Ok(FieldShape {
        cardinality,
        target,
        hints,
    })
}

fn side(model: &str, field: &str, cardinality: Cardinality) -> RelationshipSide {
    RelationshipSide {
        model: model.to_owned(),
        field: field.to_owned(),
        cardinality,
    }
}

/// Registers `model` for storage-backed operations, inferring and
/// validating every relationship its fields declare.
///
/// Idempotent: managing an already-managed struct is a no-op. After the
/// scan, every struct linked from `model` is managed in turn, so one call
/// resolves the whole connected component. Proxies must have been resolved
/// (see `TypeGraph::resolve_proxies`) before calling.
///
/// # Errors
/// See [`RelationError`]; every error aborts the build and names the
/// struct/field pair it was detected at.
pub fn manage(
    graph: &TypeGraph,
    registry: &mut Registry,
    model: TypeId,
) -> Result<(), RelationError> {
    let model_id = graph.resolved(model)?;
    let entry = graph.entry(model_id)?;
    let model_name = entry.display_name();
    let TypeNode::Struct { fields } = &entry.node else {
        return Err(RelationError::NotAStruct { name: model_name });
    };
    if registry.is_managed(&model_name) {
        return Ok(());
    }
    debug!(model = %model_name, "managing struct");
    // Mark before scanning so cyclic links terminate.
    registry.mark_managed(model_name.clone(), model_id);

    let mut linked: Vec<TypeId> = Vec::new();
    for (field_name, field_ty) in fields {
        let shape = field_shape(graph, &model_name, field_name, *field_ty)?;
        let target_entry = graph.entry(shape.target)?;
        let TypeNode::Struct {
            fields: target_fields,
        } = &target_entry.node
        else {
            // Scalars, enums, unions of scalars: not a relationship field.
            continue;
        };
        linked.push(shape.target);
        if registry.relationship_for(&model_name, field_name).is_some() {
            // Already resolved while scanning the other side.
            continue;
        }
        let target_name = target_entry.display_name();

        // Reciprocal candidates: fields of the target whose resolved type is
        // this very struct node. Identity is the concrete TypeId, not the
        // name. For self-references the field being scanned is excluded.
        let mut candidates: Vec<(String, FieldShape)> = Vec::new();
        for (back_name, back_ty) in target_fields {
            if shape.target == model_id && back_name == field_name {
                continue;
            }
            let back = field_shape(graph, &target_name, back_name, *back_ty)?;
            if back.target == model_id
                && matches!(graph.entry(back.target)?.node, TypeNode::Struct { .. })
            {
                candidates.push((back_name.clone(), back));
            }
        }

        let (other_field, other_shape) = match &shape.hints.field {
            Some(explicit) => match candidates.iter().position(|(name, _)| name == explicit) {
                Some(position) => candidates.swap_remove(position),
                None => {
                    // Explicit target names a field that does not reference
                    // back (or does not exist): same failure as no match.
                    return Err(RelationError::NoRelationshipFound {
                        model: model_name.clone(),
                        field: field_name.clone(),
                        target: target_name.clone(),
                    });
                }
            },
            None => match candidates.len() {
                0 => {
                    return Err(RelationError::NoRelationshipFound {
                        model: model_name.clone(),
                        field: field_name.clone(),
                        target: target_name.clone(),
                    });
                }
                1 => candidates.swap_remove(0),
                _ => {
                    return Err(RelationError::AmbiguousTargets {
                        model: model_name.clone(),
                        field: field_name.clone(),
                        target: target_name.clone(),
                        candidates: candidates.into_iter().map(|(name, _)| name).collect(),
                    });
                }
            },
        };

        // Symmetric ambiguity check: the chosen reciprocal field must also
        // map back to this field unambiguously. Skipped when this side
        // already selected its target explicitly.
        if shape.hints.field.is_none() {
            let mut back_candidates: Vec<String> = Vec::new();
            for (back_name, back_ty) in fields {
                if shape.target == model_id && back_name == &other_field {
                    continue;
                }
                let back = field_shape(graph, &model_name, back_name, *back_ty)?;
                if back.target == shape.target {
                    back_candidates.push(back_name.clone());
                }
            }
            if back_candidates.len() > 1 {
                match &other_shape.hints.field {
                    Some(explicit) if explicit == field_name => {}
                    Some(_) => {
                        return Err(RelationError::NoRelationshipFound {
                            model: target_name.clone(),
                            field: other_field,
                            target: model_name.clone(),
                        });
                    }
                    None => {
                        return Err(RelationError::AmbiguousTargets {
                            model: target_name.clone(),
                            field: other_field,
                            target: model_name.clone(),
                            candidates: back_candidates,
                        });
                    }
                }
            }
        }

        let card_a = shape.cardinality;
        let card_b = other_shape.cardinality;
        if card_a.is_many() && card_b.is_many() {
            return Err(RelationError::ManyToManyUnsupported {
                left_model: model_name.clone(),
                left_field: field_name.clone(),
                right_model: target_name.clone(),
                right_field: other_field,
            });
        }

        let name = match (&shape.hints.name, &other_shape.hints.name) {
            (Some(a), Some(b)) if a != b => {
                return Err(RelationError::InconsistentName {
                    left: a.clone(),
                    right: b.clone(),
                });
            }
            (Some(a), _) => a.clone(),
            (None, Some(b)) => b.clone(),
            (None, None) => registry.synthesize_name(&model_name, &target_name),
        };

        let owner_is_scanning_side = match (shape.hints.fkey, other_shape.hints.fkey) {
            (Some(true), Some(true)) | (Some(false), Some(false)) => {
                return Err(RelationError::ConflictingForeignKey {
                    left_model: model_name.clone(),
                    left_field: field_name.clone(),
                    right_model: target_name.clone(),
                    right_field: other_field,
                });
            }
            (Some(true), _) | (None, Some(false)) => true,
            (Some(false), _) | (None, Some(true)) => false,
            (None, None) => {
                if card_a.is_many() {
                    false
                } else if card_b.is_many() {
                    true
                } else {
                    // A true 1-to-1: ownership must be broken explicitly.
                    return Err(RelationError::AmbiguousSide {
                        left_model: model_name.clone(),
                        left_field: field_name.clone(),
                        right_model: target_name.clone(),
                        right_field: other_field,
                    });
                }
            }
        };

        let (owner, other) = if owner_is_scanning_side {
            (
                side(&model_name, field_name, card_a),
                side(&target_name, &other_field, card_b),
            )
        } else {
            (
                side(&target_name, &other_field, card_b),
                side(&model_name, field_name, card_a),
            )
        };
        if owner.cardinality.is_many() {
            // An explicit fkey forced ownership onto the array side.
            return Err(RelationError::ConflictingForeignKey {
                left_model: owner.model,
                left_field: owner.field,
                right_model: other.model,
                right_field: other.field,
            });
        }

        debug!(relationship = %name, owner = %owner.model, "resolved relationship");
        registry.insert(Relationship { name, owner, other })?;
    }

    // Recursive closure: the whole connected component resolves from any
    // one member.
    for target in linked {
        let target_name = graph.entry(target)?.display_name();
        if !registry.is_managed(&target_name) {
            manage(graph, registry, target)?;
        }
    }
    Ok(())
}
