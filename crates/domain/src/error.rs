//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A header name is empty or contains characters not allowed in a token.
    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// A header value contains a line break or other control character.
    #[error("invalid header value for {0}")]
    InvalidHeaderValue(String),

    /// A query parameter value cannot be encoded into a URL.
    #[error("invalid query parameter {key}: {reason}")]
    InvalidQueryParam {
        /// The offending parameter key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
