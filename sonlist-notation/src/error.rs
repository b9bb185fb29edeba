//! Error types for the notation parser.

use thiserror::Error;

/// Result type for notation parsing.
pub type NotationResult<T> = Result<T, NotationError>;

/// Errors raised while parsing relaxed notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    /// The input is not valid relaxed notation.
    #[error("malformed notation at byte {position}: {reason} in {text:?}")]
    Malformed {
        /// The original input, unmodified.
        text: String,
        /// Byte offset where parsing stopped.
        position: usize,
        reason: &'static str,
    },

    /// An already-parsed tree was expected to be an object.
    #[error("expected an object, got {found}")]
    NotAnObject { found: &'static str },
}

impl NotationError {
    /// Returns the original text for `Malformed` errors.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Malformed { text, .. } => Some(text),
            Self::NotAnObject { .. } => None,
        }
    }
}
