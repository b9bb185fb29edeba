//! Error types for schema compilation and item validation.

use serde_json::Value;
use sonlist_crypto::CryptoError;
use sonlist_notation::NotationError;
use thiserror::Error;

/// Result type for schema compilation.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for item validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised while compiling a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema text is not valid relaxed notation.
    #[error(transparent)]
    Notation(#[from] NotationError),

    /// A property map uses a key outside the six legal property names.
    #[error("invalid schema parameter {parameter:?} on field {field:?}")]
    InvalidSchemaParameter { parameter: String, field: String },

    /// A property value is itself an object.
    #[error("schema nests too deeply under field {field:?}")]
    TooManyLevels { field: String },

    #[error("unknown type {type_name:?} on field {field:?}")]
    UnknownType { field: String, type_name: String },

    #[error("invalid value for property {property:?} on field {field:?}")]
    InvalidPropertyValue {
        field: String,
        property: &'static str,
    },

    /// A field is bound to something other than a type keyword, `true`, or
    /// a property map.
    #[error("invalid specification for field {field:?}")]
    InvalidFieldSpec { field: String },

    /// `unique` cannot be combined with hashing.
    #[error("field {field:?} cannot be both unique and encrypted")]
    ConflictingProperties { field: String },
}

/// Errors raised while validating an item against a schema.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required field {field:?}")]
    MissingField { field: String },

    #[error("field {field:?} is not part of the schema")]
    InvalidField { field: String },

    #[error("field {field:?} must be of type {expected}, got {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("value {value} of field {field:?} is already taken")]
    NotUnique { field: String, value: Value },

    /// The uniqueness lookup collaborator failed.
    #[error("uniqueness lookup failed for field {field:?}: {reason}")]
    Lookup { field: String, reason: String },

    #[error("hashing field {field:?} failed: {source}")]
    Hashing {
        field: String,
        #[source]
        source: CryptoError,
    },
}

impl ValidationError {
    /// The field the error is about.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::InvalidField { field }
            | Self::WrongType { field, .. }
            | Self::NotUnique { field, .. }
            | Self::Lookup { field, .. }
            | Self::Hashing { field, .. } => field,
        }
    }
}
