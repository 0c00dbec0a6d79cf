//! Typed failures surfaced to callers of the Service API
//!
//! Every failed call ends up as exactly one [`ServiceError`] variant. Status
//! driven variants are chosen by [`crate::status::classify`], so handling can be
//! exhaustive at compile time.

use std::fmt;

use thiserror::Error;

use crate::JsonObject;
use crate::response::ResponseHeaders;

/// Name of the remote service, used in default error messages.
pub const SERVICE_NAME: &str = "Tinybird";

/// Details of a failure response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status code, or 0 when no response was involved
    pub status: u16,
    /// Response headers
    pub headers: ResponseHeaders,
    /// Decoded error payload, empty when the body was not a JSON object
    pub payload: JsonObject,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Creates an error, falling back to the default message when `message` is empty.
    #[must_use]
    pub fn new(
        status: u16,
        headers: ResponseHeaders,
        payload: JsonObject,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            format!("Request to {SERVICE_NAME} API failed with status: {status}")
        } else {
            message
        };
        Self {
            status,
            headers,
            payload,
            message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A 401/403 failure, with a masked hint of the token that was used.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationError {
    /// The failure response
    pub error: ApiError,
    /// Masked token, `None` when the client had no token configured
    pub token_hint: Option<String>,
}

impl AuthenticationError {
    /// Creates an authentication error, masking all but the last four characters of `token`.
    #[must_use]
    pub fn new(error: ApiError, token: &str) -> Self {
        Self {
            error,
            token_hint: mask_token(token),
        }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token_hint {
            Some(hint) => write!(f, "{} (token: {hint})", self.error.message),
            None => write!(f, "{} (no token configured)", self.error.message),
        }
    }
}

fn mask_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    let count = token.chars().count();
    if count <= 8 {
        return Some("****".to_string());
    }
    let tail: String = token.chars().skip(count - 4).collect();
    Some(format!("****{tail}"))
}

/// A success response whose body is not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unable to parse response body into JSON: {diagnostic}")]
pub struct ParseError {
    /// The decoder's explanation
    pub diagnostic: String,
}

impl ParseError {
    /// Creates a parse error from a decoder diagnostic.
    #[must_use]
    pub fn new(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: diagnostic.into(),
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Any failure of a call to the Service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Generic failure status.
    #[error("{0}")]
    Api(ApiError),

    /// Credentials were missing, invalid or insufficient (401/403). Never retried.
    #[error("{0}")]
    Authentication(AuthenticationError),

    /// Rate limited (429).
    #[error("{0}")]
    RateLimit(ApiError),

    /// The transport failed before any response arrived.
    #[error("Request to Tinybird API did not complete: {message}")]
    RequestTimeout {
        /// Transport diagnostic
        message: String,
    },

    /// A success response could not be decoded. Never retried.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The request could not be encoded and was never sent.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// What was wrong with it
        reason: String,
    },

    /// The task executing a batch item stopped before producing a result.
    #[error("internal error: {message}")]
    Internal {
        /// What happened to the task
        message: String,
    },
}

impl ServiceError {
    /// Creates a generic API error with no response attached.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api(ApiError::new(
            status,
            ResponseHeaders::new(),
            JsonObject::new(),
            message,
        ))
    }

    /// Creates a transport-level failure.
    #[must_use]
    pub fn request_timeout(message: impl Into<String>) -> Self {
        Self::RequestTimeout {
            message: message.into(),
        }
    }

    /// Returns the response details for status-driven variants.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) | Self::RateLimit(error) => Some(error),
            Self::Authentication(auth) => Some(&auth.error),
            Self::RequestTimeout { .. }
            | Self::Parse(_)
            | Self::InvalidRequest { .. }
            | Self::Internal { .. } => None,
        }
    }

    /// Returns the HTTP status code, if a response was received.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.api_error().map(|error| error.status)
    }

    /// Returns the response headers, if a response was received.
    #[must_use]
    pub fn headers(&self) -> Option<&ResponseHeaders> {
        self.api_error().map(|error| &error.headers)
    }

    /// Returns the decoded error payload, if a response was received.
    #[must_use]
    pub fn payload(&self) -> Option<&JsonObject> {
        self.api_error().map(|error| &error.payload)
    }

    /// Returns true for failures the single-request path retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestTimeout { .. } => true,
            Self::Api(error) | Self::RateLimit(error) => crate::status::is_retryable(error.status),
            Self::Authentication(_)
            | Self::Parse(_)
            | Self::InvalidRequest { .. }
            | Self::Internal { .. } => false,
        }
    }
}

impl From<crate::DomainError> for ServiceError {
    fn from(error: crate::DomainError) -> Self {
        Self::InvalidRequest {
            reason: error.to_string(),
        }
    }
}
