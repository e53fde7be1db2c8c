//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::path::Path;

/// Errors raised by path, tree and forest operations.
///
/// Both kinds are ordinary control flow for the caller: nothing in the crate
/// treats them as fatal, and a failed operation leaves its receiver untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyTreeError {
    #[error("key not found: \"{0}\"")]
    KeyNotFound(Path),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl KeyTreeError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result type for key tree operations.
pub type KeyTreeResult<T> = Result<T, KeyTreeError>;
