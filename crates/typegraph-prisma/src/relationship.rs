// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolved relationship data.
//!
//! Relationships are derived, never declared directly: the resolver scans
//! struct fields for links to other structs and records one
//! [`Relationship`] per reciprocal field pair. Exactly one side is the
//! owner — the side whose storage columns hold the foreign key.

/// How many instances of the other side a field can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Zero or one (`Optional(struct)` field).
    Optional,
    /// Exactly one (bare struct field).
    One,
    /// Zero or more (`Array(struct)` field).
    Many,
}

impl Cardinality {
    /// True for the array side.
    #[must_use]
    pub fn is_many(self) -> bool {
        matches!(self, Self::Many)
    }

    /// Quantifier suffix in the schema dialect (`?`, empty, or `[]`).
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Optional => "?",
            Self::One => "",
            Self::Many => "[]",
        }
    }
}

/// One side of a relationship: which struct, which field, how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipSide {
    /// Owning struct's model name.
    pub model: String,
    /// The link field's name on that struct.
    pub field: String,
    /// The field's cardinality toward the other side.
    pub cardinality: Cardinality,
}

impl RelationshipSide {
    /// True when this side is `(model, field)`.
    #[must_use]
    pub fn is_field(&self, model: &str, field: &str) -> bool {
        self.model == model && self.field == field
    }
}

/// A resolved link between two struct types.
///
/// Invariants (enforced by the resolver): at most one side is `Many`, and
/// `owner` is never the `Many` side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship name: explicit, or synthesized per build.
    pub name: String,
    /// The foreign-key side.
    pub owner: RelationshipSide,
    /// The non-owning side.
    pub other: RelationshipSide,
}

impl Relationship {
    /// True when neither side is an array (a true 1-to-1).
    #[must_use]
    pub fn is_one_to_one(&self) -> bool {
        !self.owner.cardinality.is_many() && !self.other.cardinality.is_many()
    }

    /// True when the non-owning side is an array.
    #[must_use]
    pub fn is_one_to_many(&self) -> bool {
        self.other.cardinality.is_many()
    }

    /// Returns the side at `(model, field)`, if this relationship has one.
    #[must_use]
    pub fn side(&self, model: &str, field: &str) -> Option<&RelationshipSide> {
        if self.owner.is_field(model, field) {
            Some(&self.owner)
        } else if self.other.is_field(model, field) {
            Some(&self.other)
        } else {
            None
        }
    }

    /// True when `(model, field)` is the owning side.
    #[must_use]
    pub fn owns(&self, model: &str, field: &str) -> bool {
        self.owner.is_field(model, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(model: &str, field: &str, cardinality: Cardinality) -> RelationshipSide {
        RelationshipSide {
            model: model.to_owned(),
            field: field.to_owned(),
            cardinality,
        }
    }

    #[test]
    fn predicates_follow_cardinalities() {
        let one_to_many = Relationship {
            name: "postAuthor".to_owned(),
            owner: side("Post", "author", Cardinality::One),
            other: side("User", "posts", Cardinality::Many),
        };
        assert!(one_to_many.is_one_to_many());
        assert!(!one_to_many.is_one_to_one());

        let one_to_one = Relationship {
            name: "profile".to_owned(),
            owner: side("Profile", "user", Cardinality::One),
            other: side("User", "profile", Cardinality::Optional),
        };
        assert!(one_to_one.is_one_to_one());
        assert!(!one_to_one.is_one_to_many());
    }

    #[test]
    fn side_lookup_distinguishes_owner() {
        let rel = Relationship {
            name: "r".to_owned(),
            owner: side("Post", "author", Cardinality::One),
            other: side("User", "posts", Cardinality::Many),
        };
        assert!(rel.owns("Post", "author"));
        assert!(!rel.owns("User", "posts"));
        assert!(rel.side("User", "posts").is_some());
        assert!(rel.side("User", "author").is_none());
    }
}
