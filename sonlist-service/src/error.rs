//! Service errors and their boundary classification.

use serde::Serialize;
use serde_json::Value;
use sonlist_filter::FilterError;
use sonlist_model::{SchemaError, ValidationError};
use sonlist_permissions::PermissionError;
use sonlist_storage::StorageError;
use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// How an error is reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
    InternalServerError,
}

impl ErrorKind {
    /// The HTTP status code for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid id {0:?}")]
    InvalidId(String),

    #[error("no document with id {0:?}")]
    NotFound(String),

    #[error("{0:?} is not a list")]
    NotAList(String),

    /// The request body has the wrong shape.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Forbidden(#[from] PermissionError),

    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),

    /// A concurrent write claimed a unique value first.
    #[error("value {value} of field {field:?} is already taken")]
    Duplicate { field: String, value: Value },

    /// A stored list document could not be read.
    #[error("list {id:?} is corrupt: {reason}")]
    CorruptList { id: String, reason: String },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UniqueViolation { field, value } => Self::Duplicate { field, value },
            other => Self::Storage(other),
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId(_)
            | Self::NotAList(_)
            | Self::BadRequest(_)
            | Self::Schema(_)
            | Self::Filter(_)
            | Self::Duplicate { .. } => ErrorKind::BadRequest,
            Self::Validation(ValidationError::Lookup { .. } | ValidationError::Hashing { .. }) => {
                ErrorKind::InternalServerError
            }
            Self::Validation(_) => ErrorKind::BadRequest,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            // Operators the filter compiler passed through.
            Self::Storage(StorageError::UnsupportedOperator(_) | StorageError::InvalidQuery(_)) => {
                ErrorKind::BadRequest
            }
            Self::CorruptList { .. } | Self::Storage(_) => ErrorKind::InternalServerError,
        }
    }
}
