use thiserror::Error;

/// Result type for permission checks.
pub type PermissionResult<T> = Result<T, PermissionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("{user:?} may not {access} this list")]
    Forbidden { user: String, access: &'static str },
}
