// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relationship resolution and schema generation errors.
//!
//! All of these are fatal to the current build. Each variant carries the
//! struct/field addressing context the user needs to fix the declarative
//! input (add a link hint, rename a field, set a foreign-key flag).
use thiserror::Error;
use typegraph_core::GraphError;

/// Errors raised by the relationship resolver and the schema generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationError {
    /// The named model was never managed (or never named).
    #[error("unknown model `{model}`")]
    UnknownModel {
        /// The requested model name.
        model: String,
    },
    /// A node expected to be a struct is some other variant.
    #[error("type `{name}` is not a struct")]
    NotAStruct {
        /// Display name of the offending node.
        name: String,
    },
    /// A field nests quantifiers (array of optional, optional of optional
    /// of struct, ...). At most one level of `Optional` or `Array` may wrap
    /// a relationship target.
    #[error("field `{model}.{field}` nests quantifiers")]
    NestedQuantifier {
        /// Owning struct name.
        model: String,
        /// Field name.
        field: String,
    },
    /// A struct-typed field has no reciprocal field on the target struct.
    #[error("no relationship field found on `{target}` for `{model}.{field}`")]
    NoRelationshipFound {
        /// Owning struct name.
        model: String,
        /// Field name.
        field: String,
        /// The struct scanned for a reciprocal field.
        target: String,
    },
    /// More than one reciprocal candidate exists and no explicit target
    /// field was given.
    #[error(
        "ambiguous relationship targets on `{target}` for `{model}.{field}`: \
         candidates are {}; declare an explicit target field",
        candidates.join(", ")
    )]
    AmbiguousTargets {
        /// Owning struct name.
        model: String,
        /// Field name.
        field: String,
        /// The struct holding the candidates.
        target: String,
        /// All reciprocal candidate field names.
        candidates: Vec<String>,
    },
    /// A one-to-one relationship has no explicit foreign-key side.
    #[error(
        "ambiguous foreign-key side between `{left_model}.{left_field}` and \
         `{right_model}.{right_field}`; set fkey on exactly one side"
    )]
    AmbiguousSide {
        /// First side's struct name.
        left_model: String,
        /// First side's field name.
        left_field: String,
        /// Second side's struct name.
        right_model: String,
        /// Second side's field name.
        right_field: String,
    },
    /// Both sides of an inferred relationship have array cardinality.
    /// Many-to-many requires an explicit join struct.
    #[error(
        "many-to-many between `{left_model}.{left_field}` and \
         `{right_model}.{right_field}` is not supported; add an explicit join struct"
    )]
    ManyToManyUnsupported {
        /// First side's struct name.
        left_model: String,
        /// First side's field name.
        left_field: String,
        /// Second side's struct name.
        right_model: String,
        /// Second side's field name.
        right_field: String,
    },
    /// The two sides declare different explicit relationship names.
    #[error("inconsistent relationship names: `{left}` vs `{right}`")]
    InconsistentName {
        /// Name declared on the scanning side.
        left: String,
        /// Name declared on the reciprocal side.
        right: String,
    },
    /// The explicit foreign-key flags on the two sides conflict, or a
    /// foreign key was requested on an array side.
    #[error(
        "conflicting foreign-key flags between `{left_model}.{left_field}` and \
         `{right_model}.{right_field}`"
    )]
    ConflictingForeignKey {
        /// First side's struct name.
        left_model: String,
        /// First side's field name.
        left_field: String,
        /// Second side's struct name.
        right_model: String,
        /// Second side's field name.
        right_field: String,
    },
    /// Two distinct relationships claim the same explicit name.
    #[error("relationship name `{name}` is already in use")]
    DuplicateRelationshipName {
        /// The contested relationship name.
        name: String,
    },
    /// A relationship references a struct with no id field to point at.
    #[error("model `{model}` has no id field to reference")]
    NoIdField {
        /// The referenced struct name.
        model: String,
    },
    /// A field's type cannot be rendered in the schema dialect.
    #[error("field `{model}.{field}` has a type unsupported by the schema generator")]
    UnsupportedField {
        /// Owning struct name.
        model: String,
        /// Field name.
        field: String,
    },
    /// Graph-level failure (unresolved proxy, unknown id) surfaced during
    /// resolution or generation.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
