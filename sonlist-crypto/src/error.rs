//! Error types for the hashing layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The cost parameters were rejected by Argon2.
    #[error("invalid hash parameters: {0}")]
    InvalidParams(String),

    /// Hashing failed.
    #[error("hashing failed: {0}")]
    Hashing(String),

    /// A stored hash could not be decoded.
    #[error("malformed hash string: {0}")]
    MalformedHash(String),
}
