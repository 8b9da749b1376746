//! Error types for the plancal ecosystem.

use thiserror::Error;

/// Errors that can occur in plancal operations.
#[derive(Error, Debug)]
pub enum PlancalError {
    /// Caller-supplied input failed a precondition. Never mutates state.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation would break a structural invariant
    /// (e.g., deleting the last calendar of a project).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The document store reported a transport/permission/unknown failure.
    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for plancal operations.
pub type PlancalResult<T> = Result<T, PlancalError>;
