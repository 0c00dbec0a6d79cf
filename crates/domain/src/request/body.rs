//! HTTP Request body types

use serde::{Deserialize, Serialize};

use crate::JsonObject;

/// HTTP request body as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum RequestBody {
    /// No body
    #[default]
    None,
    /// A JSON object, serialized with `Content-Type: application/json`
    Json(JsonObject),
    /// A pre-encoded body (NDJSON, CSV, SQL...) sent verbatim
    Raw(String),
}

impl RequestBody {
    /// Creates an empty body.
    #[must_use]
    pub const fn none() -> Self {
        Self::None
    }

    /// Creates a JSON body from an object.
    #[must_use]
    pub const fn json(object: JsonObject) -> Self {
        Self::Json(object)
    }

    /// Creates a raw body sent as-is.
    #[must_use]
    pub fn raw(content: impl Into<String>) -> Self {
        Self::Raw(content.into())
    }

    /// Returns whether the body carries nothing to send.
    ///
    /// Empty objects and empty strings count as empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Json(object) => object.is_empty(),
            Self::Raw(content) => content.is_empty(),
        }
    }
}

impl From<JsonObject> for RequestBody {
    fn from(object: JsonObject) -> Self {
        Self::Json(object)
    }
}

impl From<String> for RequestBody {
    fn from(content: String) -> Self {
        Self::Raw(content)
    }
}

impl From<&str> for RequestBody {
    fn from(content: &str) -> Self {
        Self::Raw(content.to_string())
    }
}
