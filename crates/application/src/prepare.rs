//! Path, query and body encoding

use tinybird_domain::{
    ApiRequest, Headers, PreparedRequest, QueryParams, RequestBody, ServiceError,
};

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";

/// Encodes logical requests into transport-ready requests.
#[derive(Debug, Clone)]
pub struct RequestPreparer {
    api_version: String,
}

impl RequestPreparer {
    /// Creates a preparer prefixing paths with `api_version`.
    #[must_use]
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
        }
    }

    /// Builds the prepared form of `request`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidRequest` if the query, headers or body
    /// cannot be encoded. Nothing is sent in that case.
    pub fn prepare(&self, request: &ApiRequest) -> Result<PreparedRequest, ServiceError> {
        let path = self.build_path(&request.path, &request.query)?;
        let mut headers = request.headers.clone();
        let body = encode_body(&request.body, &mut headers)?;
        headers.validate()?;

        Ok(PreparedRequest {
            method: request.method,
            path,
            headers,
            body,
        })
    }

    /// Returns `/<version>/<path>` with the encoded query appended.
    ///
    /// Leading slashes on `path` are dropped. The query is joined with `&` when
    /// the path already carries a query string.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidRequest` for query values that cannot be encoded.
    pub fn build_path(&self, path: &str, query: &QueryParams) -> Result<String, ServiceError> {
        let path = format!("/{}/{}", self.api_version, path.trim_start_matches('/'));

        let pairs = query.to_pairs()?;
        if pairs.is_empty() {
            return Ok(path);
        }

        let encoded =
            serde_urlencoded::to_string(&pairs).map_err(|e| ServiceError::InvalidRequest {
                reason: format!("query is not encodable: {e}"),
            })?;
        let separator = if path.contains('?') { '&' } else { '?' };

        Ok(format!("{path}{separator}{encoded}"))
    }
}

fn encode_body(body: &RequestBody, headers: &mut Headers) -> Result<Option<String>, ServiceError> {
    if body.is_empty() {
        return Ok(None);
    }

    match body {
        RequestBody::None => Ok(None),
        RequestBody::Raw(content) => Ok(Some(content.clone())),
        RequestBody::Json(object) => {
            let encoded =
                serde_json::to_string(object).map_err(|e| ServiceError::InvalidRequest {
                    reason: format!("body is not serializable: {e}"),
                })?;
            headers.set(CONTENT_TYPE, APPLICATION_JSON);
            Ok(Some(encoded))
        }
    }
}
