//! Client configuration
//!
//! Options are plain data. A coordinator takes its own copy at construction,
//! so changing an options value later never affects requests already running.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry behaviour for single requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one.
    pub max_retries: u32,
    /// Starting delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after each failed attempt.
    pub backoff_multiplier: u32,
}

impl RetryPolicy {
    /// Default number of attempts.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Default starting delay.
    pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2000;
    /// Default backoff factor.
    pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;

    /// Creates a policy.
    #[must_use]
    pub const fn new(max_retries: u32, initial_delay_ms: u64, backoff_multiplier: u32) -> Self {
        Self {
            max_retries,
            initial_delay_ms,
            backoff_multiplier,
        }
    }

    /// Returns the starting delay.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_RETRIES,
            Self::DEFAULT_INITIAL_DELAY_MS,
            Self::DEFAULT_BACKOFF_MULTIPLIER,
        )
    }
}

/// Connection and behaviour settings for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// API token; empty means unauthenticated.
    pub token: String,
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Version segment prefixed to every path.
    pub api_version: String,
    /// Transport timeout in seconds.
    pub timeout_secs: u64,
    /// Whether to negotiate gzip responses.
    pub compression: bool,
    /// Retry policy for single requests.
    pub retry: RetryPolicy,
}

impl ClientOptions {
    /// Default API version.
    pub const DEFAULT_API_VERSION: &'static str = "v0";
    /// Default base URL (GCP europe-west3).
    pub const DEFAULT_BASE_URL: &'static str = "https://api.tinybird.co";
    /// Default transport timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
    /// Default port of a local Tinybird container.
    pub const DEFAULT_LOCAL_PORT: u16 = 7181;

    /// Creates options with default values and no token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a token is configured.
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// Returns the transport timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Sets the API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Sets the base URL, dropping any trailing slashes.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Points the client at a local Tinybird container.
    #[must_use]
    pub fn use_local(self, port: u16) -> Self {
        self.with_base_url(format!("http://localhost:{port}"))
    }

    /// Sets the API version segment.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Sets the transport timeout in seconds.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Enables or disables gzip negotiation.
    #[must_use]
    pub const fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_version: Self::DEFAULT_API_VERSION.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            compression: false,
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_values() {
        let options = ClientOptions::new();

        assert_eq!(options.token, "");
        assert!(!options.has_token());
        assert_eq!(options.base_url, "https://api.tinybird.co");
        assert_eq!(options.api_version, "v0");
        assert_eq!(options.timeout(), Duration::from_secs(60));
        assert!(!options.compression);
        assert_eq!(options.retry, RetryPolicy::new(3, 2000, 2));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let options = ClientOptions::new().with_base_url("https://custom.api.com/");
        assert_eq!(options.base_url, "https://custom.api.com");
    }

    #[test]
    fn test_use_local() {
        let options = ClientOptions::new().use_local(ClientOptions::DEFAULT_LOCAL_PORT);
        assert_eq!(options.base_url, "http://localhost:7181");

        let options = ClientOptions::new().use_local(8080);
        assert_eq!(options.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_builder_chain() {
        let options = ClientOptions::new()
            .with_token("token")
            .with_timeout_secs(30)
            .with_compression(true)
            .with_api_version("v1")
            .with_retry(RetryPolicy::new(5, 100, 3));

        assert!(options.has_token());
        assert_eq!(options.timeout_secs, 30);
        assert!(options.compression);
        assert_eq!(options.api_version, "v1");
        assert_eq!(options.retry.initial_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: ClientOptions =
            serde_json::from_str(r#"{"token":"t","retry":{"max_retries":1}}"#).unwrap();

        assert_eq!(options.token, "t");
        assert_eq!(options.api_version, "v0");
        assert_eq!(options.retry.max_retries, 1);
        assert_eq!(options.retry.initial_delay_ms, 2000);
    }
}
