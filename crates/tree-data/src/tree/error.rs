//! Error types for dataset handling

use serde_json::Value;
use thiserror::Error;

/// Errors signalled for structurally invalid input
///
/// Lookups never produce these; a miss is an empty result.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The dataset or one of its nodes does not have the expected shape
    #[error("invalid dataset: {reason}")]
    InvalidInput { reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}

impl TreeError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        TreeError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TreeError {
    fn from(err: serde_json::Error) -> Self {
        TreeError::invalid(err.to_string())
    }
}

/// A cell value that did not satisfy a [`CellSchema`](crate::tree::CellSchema)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cell `{cell}` expected {expected}, found {found}")]
pub struct ValidationFailure {
    /// Key of the offending cell
    pub cell: String,
    /// Human-readable description of what the schema wanted
    pub expected: String,
    /// The value as it was found on the node
    pub found: Value,
}

/// Result type for dataset operations
pub type Result<T, E = TreeError> = std::result::Result<T, E>;
