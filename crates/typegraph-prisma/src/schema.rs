// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema text generation.
//!
//! Walks a fully resolved [`Registry`] and emits one model block per
//! struct, in the order the caller asks for. Output is deterministic: the
//! same registry and the same ordered input produce byte-identical text.
//! The text is syntactically valid but not pretty — canonical whitespace is
//! the external formatter's job.
use typegraph_core::{StringFormat, TypeGraph, TypeId, TypeNode};

use crate::error::RelationError;
use crate::registry::Registry;
use crate::relationship::Relationship;
use crate::resolver::field_shape;

/// Maps a scalar node to its schema primitive and optional native-type tag.
fn prisma_scalar(node: &TypeNode) -> Option<(&'static str, Option<&'static str>)> {
    match node {
        TypeNode::Boolean => Some(("Boolean", None)),
        TypeNode::Integer => Some(("Int", None)),
        TypeNode::Float => Some(("Float", None)),
        TypeNode::String {
            format: Some(StringFormat::DateTime),
        } => Some(("DateTime", None)),
        TypeNode::String {
            format: Some(StringFormat::Uuid),
        } => Some(("String", Some("@db.Uuid"))),
        TypeNode::String { .. } => Some(("String", None)),
        _ => None,
    }
}

/// Foreign-key column name: `{field}{IdField}` with the id field titlecased.
fn fk_column(field: &str, id_field: &str) -> String {
    let mut chars = id_field.chars();
    match chars.next() {
        Some(first) => format!("{field}{}{}", first.to_uppercase(), chars.as_str()),
        None => field.to_owned(),
    }
}

/// Reads a boolean config flag from any node on the field's unwrap path:
/// the field node itself, its resolution, and (for quantified fields) the
/// node one level in.
fn has_flag(graph: &TypeGraph, ty: TypeId, key: &str) -> Result<bool, RelationError> {
    if graph.entry(ty)?.config_flag(key) {
        return Ok(true);
    }
    let outer = graph.resolved_entry(ty)?;
    if outer.config_flag(key) {
        return Ok(true);
    }
    if let TypeNode::Optional { of } | TypeNode::Array { of } = &outer.node {
        if graph.entry(*of)?.config_flag(key) {
            return Ok(true);
        }
        if graph.resolved_entry(*of)?.config_flag(key) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The id-tagged scalar fields of a struct: `(name, primitive, native tag)`.
fn id_scalar_fields(
    graph: &TypeGraph,
    model: &str,
    fields: &[(String, TypeId)],
) -> Result<Vec<(String, &'static str, Option<&'static str>)>, RelationError> {
    let mut out = Vec::new();
    for (name, ty) in fields {
        if !has_flag(graph, *ty, "id")? {
            continue;
        }
        let shape = field_shape(graph, model, name, *ty)?;
        if let Some((primitive, native)) = prisma_scalar(&graph.entry(shape.target)?.node) {
            out.push((name.clone(), primitive, native));
        }
    }
    Ok(out)
}

/// Renders one non-relation field.
fn scalar_line(
    graph: &TypeGraph,
    model: &str,
    field: &str,
    ty: TypeId,
    composite_id: bool,
) -> Result<String, RelationError> {
    let shape = field_shape(graph, model, field, ty)?;
    let target = graph.entry(shape.target)?;
    let (primitive, native) =
        prisma_scalar(&target.node).ok_or_else(|| RelationError::UnsupportedField {
            model: model.to_owned(),
            field: field.to_owned(),
        })?;

    let mut line = format!("{field} {primitive}{}", shape.cardinality.suffix());
    if has_flag(graph, ty, "id")? && !composite_id {
        line.push_str(" @id");
    }
    if has_flag(graph, ty, "unique")? {
        line.push_str(" @unique");
    }
    if has_flag(graph, ty, "auto")? {
        match &target.node {
            TypeNode::Integer => line.push_str(" @default(autoincrement())"),
            TypeNode::String {
                format: Some(StringFormat::Uuid),
            } => line.push_str(" @default(uuid())"),
            _ => {}
        }
    }
    if let Some(native) = native {
        line.push(' ');
        line.push_str(native);
    }
    Ok(line)
}

/// Renders the owning side of a relationship: the relation tag with its
/// foreign-key columns plus one synthetic scalar field per column.
fn owning_lines(
    graph: &TypeGraph,
    registry: &Registry,
    relationship: &Relationship,
    field: &str,
    lines: &mut Vec<String>,
) -> Result<(), RelationError> {
    let target_model = &relationship.other.model;
    let target_id = registry
        .model(target_model)
        .ok_or_else(|| RelationError::UnknownModel {
            model: target_model.clone(),
        })?;
    let target_entry = graph.entry(target_id)?;
    let TypeNode::Struct { fields } = &target_entry.node else {
        return Err(RelationError::NotAStruct {
            name: target_model.clone(),
        });
    };
    let ids = id_scalar_fields(graph, target_model, fields)?;
    if ids.is_empty() {
        return Err(RelationError::NoIdField {
            model: target_model.clone(),
        });
    }

    let suffix = relationship.owner.cardinality.suffix();
    let columns: Vec<String> = ids.iter().map(|(name, _, _)| fk_column(field, name)).collect();
    let references: Vec<&str> = ids.iter().map(|(name, _, _)| name.as_str()).collect();
    lines.push(format!(
        "{field} {target_model}{suffix} @relation(name: \"{}\", fields: [{}], references: [{}])",
        relationship.name,
        columns.join(", "),
        references.join(", ")
    ));

    // Composite ids on the referenced struct produce one column each.
    for (column, (_, primitive, native)) in columns.iter().zip(&ids) {
        let mut line = format!("{column} {primitive}{suffix}");
        if relationship.is_one_to_one() {
            line.push_str(" @unique");
        }
        if let Some(native) = native {
            line.push(' ');
            line.push_str(native);
        }
        lines.push(line);
    }
    Ok(())
}

/// Renders one model block for a managed struct.
///
/// # Errors
/// Returns [`RelationError::UnknownModel`] if `model` was never managed,
/// and the schema-level errors documented on [`RelationError`] for
/// unrepresentable fields.
pub fn build_model(
    graph: &TypeGraph,
    registry: &Registry,
    model: &str,
) -> Result<String, RelationError> {
    let model_id = registry
        .model(model)
        .ok_or_else(|| RelationError::UnknownModel {
            model: model.to_owned(),
        })?;
    let entry = graph.entry(model_id)?;
    let TypeNode::Struct { fields } = &entry.node else {
        return Err(RelationError::NotAStruct {
            name: model.to_owned(),
        });
    };

    let id_fields = id_scalar_fields(graph, model, fields)?;
    let composite_id = id_fields.len() > 1;

    let mut lines: Vec<String> = Vec::new();
    for (field_name, field_ty) in fields {
        match registry.relationship_for(model, field_name) {
            Some(relationship) if relationship.owns(model, field_name) => {
                owning_lines(graph, registry, relationship, field_name, &mut lines)?;
            }
            Some(relationship) => {
                // Non-owning side: bare relation tag, no columns.
                lines.push(format!(
                    "{field_name} {}{} @relation(name: \"{}\")",
                    relationship.owner.model,
                    relationship.other.cardinality.suffix(),
                    relationship.name
                ));
            }
            None => {
                lines.push(scalar_line(graph, model, field_name, *field_ty, composite_id)?);
            }
        }
    }
    if composite_id {
        let names: Vec<&str> = id_fields.iter().map(|(name, _, _)| name.as_str()).collect();
        lines.push(format!("@@id([{}])", names.join(", ")));
    }

    let mut out = format!("model {model} {{\n");
    for line in &lines {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('}');
    Ok(out)
}

/// Renders model blocks for `models` in the given order, separated by blank
/// lines. Both orderings of the same pair of structs are valid call
/// patterns and each produces stable output.
///
/// # Errors
/// Same as [`build_model`].
pub fn build_schema(
    graph: &TypeGraph,
    registry: &Registry,
    models: &[&str],
) -> Result<String, RelationError> {
    let blocks: Vec<String> = models
        .iter()
        .map(|model| build_model(graph, registry, model))
        .collect::<Result<_, _>>()?;
    Ok(blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fk_columns_titlecase_the_id_field() {
        assert_eq!(fk_column("author", "id"), "authorId");
        assert_eq!(fk_column("owner", "serialNumber"), "ownerSerialNumber");
    }

    #[test]
    fn scalar_mapping_covers_formats() {
        assert_eq!(prisma_scalar(&TypeNode::Integer), Some(("Int", None)));
        assert_eq!(
            prisma_scalar(&TypeNode::String { format: None }),
            Some(("String", None))
        );
        assert_eq!(
            prisma_scalar(&TypeNode::String {
                format: Some(StringFormat::DateTime)
            }),
            Some(("DateTime", None))
        );
        assert_eq!(
            prisma_scalar(&TypeNode::String {
                format: Some(StringFormat::Uuid)
            }),
            Some(("String", Some("@db.Uuid")))
        );
        assert_eq!(prisma_scalar(&TypeNode::Struct { fields: vec![] }), None);
    }
}
