//! Response classification and decoding

use serde_json::Value;
use tinybird_domain::status::{self, ErrorClass};
use tinybird_domain::{
    ApiError, AuthenticationError, JsonObject, ParseError, ServiceError, TransportResponse,
};

/// Turns raw transport responses into decoded bodies or typed errors.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    token: String,
}

impl ResponseParser {
    /// Creates a parser. The token only feeds the masked hint on authentication errors.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Returns true if the status code is below 300.
    #[must_use]
    pub const fn is_success(&self, response: &TransportResponse) -> bool {
        response.is_success()
    }

    /// Returns the decoded body of a success response, or the typed error of a failure.
    ///
    /// # Errors
    ///
    /// Returns the error built by [`Self::create_error`] for a failure status,
    /// or `ServiceError::Parse` for an undecodable success body.
    pub fn parse(&self, response: &TransportResponse) -> Result<JsonObject, ServiceError> {
        if !self.is_success(response) {
            return Err(self.create_error(response));
        }
        Ok(self.parse_body(response)?)
    }

    /// Decodes a body as a JSON object. An empty body decodes to an empty object.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` with the decoder diagnostic if the body is not
    /// valid JSON or not an object.
    pub fn parse_body(&self, response: &TransportResponse) -> Result<JsonObject, ParseError> {
        if response.body.is_empty() {
            return Ok(JsonObject::new());
        }

        match serde_json::from_slice::<Value>(&response.body)? {
            Value::Object(object) => Ok(object),
            other => Err(ParseError::new(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Builds the typed error for a failure response.
    ///
    /// Pure function of status, headers and body. An undecodable body yields an
    /// empty payload rather than an error.
    #[must_use]
    pub fn create_error(&self, response: &TransportResponse) -> ServiceError {
        let payload = self.parse_body(response).unwrap_or_default();
        let message = match payload.get("error") {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let error = ApiError::new(
            response.status,
            response.headers.clone(),
            payload,
            message,
        );

        match status::classify(response.status) {
            ErrorClass::Authentication => {
                ServiceError::Authentication(AuthenticationError::new(error, &self.token))
            }
            ErrorClass::RateLimit => ServiceError::RateLimit(error),
            ErrorClass::Api => ServiceError::Api(error),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
