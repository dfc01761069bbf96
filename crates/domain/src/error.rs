//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur while inspecting auth values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The token value does not have the structure its kind requires.
    #[error("malformed token: {0}")]
    MalformedToken(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
