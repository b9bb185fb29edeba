use sonlist_notation::NotationError;
use thiserror::Error;

/// Result type for filter compilation.
pub type FilterResult<T> = Result<T, FilterError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error(transparent)]
    Notation(#[from] NotationError),

    /// A converter received something other than its expected operands.
    #[error("invalid operands for {operator}: {reason}")]
    InvalidOperands {
        operator: &'static str,
        reason: &'static str,
    },
}
