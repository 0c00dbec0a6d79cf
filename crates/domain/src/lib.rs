//! Tinybird Domain - Core types for the Tinybird API client
//!
//! This crate defines the request, response, error and configuration types
//! shared by every layer. All types here are pure Rust with no I/O dependencies.

pub mod batch;
pub mod error;
pub mod options;
pub mod request;
pub mod response;
pub mod service_error;
pub mod status;

/// A decoded JSON object, the shape of every Service response body.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

pub use batch::BatchResult;
pub use error::{DomainError, DomainResult};
pub use options::{ClientOptions, RetryPolicy};
pub use request::{ApiRequest, Headers, HttpMethod, PreparedRequest, QueryParams, RequestBody};
pub use response::{ResponseHeaders, TransportResponse};
pub use service_error::{ApiError, AuthenticationError, ParseError, ServiceError};
