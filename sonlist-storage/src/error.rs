//! Error types for the storage layer.

use serde_json::Value;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A write would duplicate a value in a field that must be unique.
    #[error("value {value} of field {field:?} is already taken")]
    UniqueViolation { field: String, value: Value },

    /// The filter or update uses an operator the matcher does not implement.
    #[error("unsupported operator {0:?}")]
    UnsupportedOperator(String),

    /// The filter is structurally invalid.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The update document is structurally invalid.
    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    /// A stored row is not a JSON object.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("connection lock poisoned")]
    LockPoisoned,

    /// A blocking database task failed to complete.
    #[error("storage task failed: {0}")]
    Task(String),
}
