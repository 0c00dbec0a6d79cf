//! Logical request types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Headers, HttpMethod, QueryParams, RequestBody};

/// A caller's intent to call the Service, before any encoding.
///
/// Paths are relative to the API version (`pipes/my_pipe.json`, not
/// `/v0/pipes/my_pipe.json`). Builder methods consume `self`, so a request is
/// never modified once handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path below the API version prefix
    pub path: String,
    /// Query parameters
    #[serde(default)]
    pub query: QueryParams,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
    /// Extra request headers
    #[serde(default)]
    pub headers: Headers,
}

impl ApiRequest {
    /// Creates a request with no query, body or headers.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: RequestBody::none(),
            headers: Headers::new(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request with the given body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: impl Into<RequestBody>) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.add(key, value);
        self
    }

    /// Replaces the query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }
}

/// A request after path, query and body encoding, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Version-prefixed path including the encoded query string
    pub path: String,
    /// Headers to send, including any added during body encoding
    pub headers: Headers,
    /// Encoded body, if any
    pub body: Option<String>,
}
