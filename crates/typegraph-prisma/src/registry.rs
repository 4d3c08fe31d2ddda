// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-build relationship registry.
//!
//! Created fresh per graph build, populated by the resolver as structs are
//! managed, consumed once by the schema generator, then discarded. It does
//! not outlive one build.
use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use typegraph_core::TypeId;

use crate::error::RelationError;
use crate::relationship::Relationship;

/// Mutable resolution state shared between the resolver and the schema
/// generator for one build.
#[derive(Debug, Default)]
pub struct Registry {
    /// Model name -> struct node, for every managed struct.
    models: BTreeMap<String, TypeId>,
    relationships: Vec<Relationship>,
    /// `(model, field)` -> index into `relationships`, both sides recorded.
    by_field: FxHashMap<(String, String), usize>,
    /// Relationship name -> index into `relationships`.
    by_name: FxHashMap<String, usize>,
    /// Already-scanned struct names; makes `manage` idempotent.
    managed: FxHashSet<String>,
    /// Monotonic counter for synthesized relationship names.
    counter: u32,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the named struct has already been scanned.
    #[must_use]
    pub fn is_managed(&self, model: &str) -> bool {
        self.managed.contains(model)
    }

    /// Looks up a managed model's struct node by name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<TypeId> {
        self.models.get(name).copied()
    }

    /// Iterates managed models in name order.
    pub fn models(&self) -> impl Iterator<Item = (&String, TypeId)> {
        self.models.iter().map(|(name, &id)| (name, id))
    }

    /// Every resolved relationship, in resolution order.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// The relationship one of whose sides is `(model, field)`, if any.
    #[must_use]
    pub fn relationship_for(&self, model: &str, field: &str) -> Option<&Relationship> {
        self.by_field
            .get(&(model.to_owned(), field.to_owned()))
            .map(|&index| &self.relationships[index])
    }

    /// The relationship with the given name, if any.
    #[must_use]
    pub fn relationship_named(&self, name: &str) -> Option<&Relationship> {
        self.by_name.get(name).map(|&index| &self.relationships[index])
    }

    pub(crate) fn mark_managed(&mut self, model: String, id: TypeId) {
        self.managed.insert(model.clone());
        self.models.insert(model, id);
    }

    /// Synthesizes a relationship name. Stable within one build (monotonic
    /// counter), not across builds.
    pub(crate) fn synthesize_name(&mut self, left: &str, right: &str) -> String {
        let n = self.counter;
        self.counter += 1;
        format!("__rel_{left}_{right}_{n}")
    }

    /// Records a resolved relationship under both field keys and its name,
    /// consuming both field pairs so a later scan of the other side does
    /// not re-derive it.
    pub(crate) fn insert(&mut self, relationship: Relationship) -> Result<(), RelationError> {
        if self.by_name.contains_key(&relationship.name) {
            return Err(RelationError::DuplicateRelationshipName {
                name: relationship.name,
            });
        }
        let index = self.relationships.len();
        self.by_field.insert(
            (
                relationship.owner.model.clone(),
                relationship.owner.field.clone(),
            ),
            index,
        );
        self.by_field.insert(
            (
                relationship.other.model.clone(),
                relationship.other.field.clone(),
            ),
            index,
        );
        self.by_name.insert(relationship.name.clone(), index);
        self.relationships.push(relationship);
        Ok(())
    }
}
