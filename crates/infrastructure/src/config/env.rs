//! Configuration from environment variables
//!
//! ## Environment Variables
//! - `TINYBIRD_TOKEN`: API token
//! - `TINYBIRD_BASE_URL`: API base URL
//! - `TINYBIRD_LOCAL`: target a local container (`true`, `1` or `yes`)
//! - `TINYBIRD_PORT`: local container port, used with `TINYBIRD_LOCAL`
//! - `TINYBIRD_API_VERSION`: version segment prefixed to paths
//! - `TINYBIRD_TIMEOUT`: transport timeout in seconds
//! - `TINYBIRD_COMPRESSION`: negotiate gzip responses (true/false)
//! - `TINYBIRD_MAX_RETRIES`: attempts per request
//! - `TINYBIRD_RETRY_DELAY_MS`: starting backoff delay
//! - `TINYBIRD_RETRY_BACKOFF_MULTIPLIER`: backoff factor
//!
//! Unset or blank variables keep the `ClientOptions` default. When
//! `TINYBIRD_LOCAL` is enabled it takes precedence over `TINYBIRD_BASE_URL`.

use std::str::FromStr;

use thiserror::Error;
use tinybird_domain::{ClientOptions, RetryPolicy};

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set to something that does not parse.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value found
        value: String,
        /// Parser diagnostic
        reason: String,
    },
}

/// Loads [`ClientOptions`] from `TINYBIRD_*` variables.
pub struct EnvConfig;

impl EnvConfig {
    /// API token.
    pub const TOKEN: &'static str = "TINYBIRD_TOKEN";
    /// API base URL.
    pub const BASE_URL: &'static str = "TINYBIRD_BASE_URL";
    /// Local container switch.
    pub const LOCAL: &'static str = "TINYBIRD_LOCAL";
    /// Local container port.
    pub const PORT: &'static str = "TINYBIRD_PORT";
    /// API version.
    pub const API_VERSION: &'static str = "TINYBIRD_API_VERSION";
    /// Timeout in seconds.
    pub const TIMEOUT: &'static str = "TINYBIRD_TIMEOUT";
    /// gzip negotiation.
    pub const COMPRESSION: &'static str = "TINYBIRD_COMPRESSION";
    /// Attempts per request.
    pub const MAX_RETRIES: &'static str = "TINYBIRD_MAX_RETRIES";
    /// Starting backoff delay.
    pub const RETRY_DELAY_MS: &'static str = "TINYBIRD_RETRY_DELAY_MS";
    /// Backoff factor.
    pub const RETRY_BACKOFF_MULTIPLIER: &'static str = "TINYBIRD_RETRY_BACKOFF_MULTIPLIER";

    /// Loads options from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a variable that does not parse.
    pub fn from_env() -> Result<ClientOptions, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads options through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a variable that does not parse.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientOptions, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut options = ClientOptions::new();

        if let Some(token) = var(Self::TOKEN) {
            options = options.with_token(token);
        }

        if let Some(base_url) = var(Self::BASE_URL) {
            options = options.with_base_url(base_url);
        }

        if var(Self::LOCAL).is_some_and(|value| is_truthy(&value)) {
            let port = parse(Self::PORT, var(Self::PORT))?
                .unwrap_or(ClientOptions::DEFAULT_LOCAL_PORT);
            options = options.use_local(port);
        }

        if let Some(api_version) = var(Self::API_VERSION) {
            options = options.with_api_version(api_version);
        }

        if let Some(timeout_secs) = parse(Self::TIMEOUT, var(Self::TIMEOUT))? {
            options = options.with_timeout_secs(timeout_secs);
        }

        if let Some(compression) = var(Self::COMPRESSION) {
            options = options.with_compression(is_truthy(&compression));
        }

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy::new(
            parse(Self::MAX_RETRIES, var(Self::MAX_RETRIES))?.unwrap_or(defaults.max_retries),
            parse(Self::RETRY_DELAY_MS, var(Self::RETRY_DELAY_MS))?
                .unwrap_or(defaults.initial_delay_ms),
            parse(
                Self::RETRY_BACKOFF_MULTIPLIER,
                var(Self::RETRY_BACKOFF_MULTIPLIER),
            )?
            .unwrap_or(defaults.backoff_multiplier),
        );

        tracing::debug!(
            base_url = %options.base_url,
            api_version = %options.api_version,
            has_token = options.has_token(),
            "configuration loaded from environment"
        );

        Ok(options.with_retry(retry))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse<T>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ClientOptions, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        EnvConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(load(&[]).unwrap(), ClientOptions::default());
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let options = load(&[("TINYBIRD_TOKEN", "  "), ("TINYBIRD_TIMEOUT", "")]).unwrap();
        assert!(!options.has_token());
        assert_eq!(options.timeout_secs, ClientOptions::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_full_environment() {
        let options = load(&[
            ("TINYBIRD_TOKEN", "p.token"),
            ("TINYBIRD_BASE_URL", "https://api.us-east.aws.tinybird.co/"),
            ("TINYBIRD_API_VERSION", "v1"),
            ("TINYBIRD_TIMEOUT", "15"),
            ("TINYBIRD_COMPRESSION", "TRUE"),
            ("TINYBIRD_MAX_RETRIES", "5"),
            ("TINYBIRD_RETRY_DELAY_MS", "250"),
            ("TINYBIRD_RETRY_BACKOFF_MULTIPLIER", "3"),
        ])
        .unwrap();

        assert_eq!(options.token, "p.token");
        assert_eq!(options.base_url, "https://api.us-east.aws.tinybird.co");
        assert_eq!(options.api_version, "v1");
        assert_eq!(options.timeout_secs, 15);
        assert!(options.compression);
        assert_eq!(options.retry, RetryPolicy::new(5, 250, 3));
    }

    #[test]
    fn test_local_overrides_base_url() {
        let options = load(&[
            ("TINYBIRD_BASE_URL", "https://api.tinybird.co"),
            ("TINYBIRD_LOCAL", "yes"),
            ("TINYBIRD_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(options.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_local_uses_default_port() {
        let options = load(&[("TINYBIRD_LOCAL", "1")]).unwrap();
        assert_eq!(options.base_url, "http://localhost:7181");
    }

    #[test]
    fn test_local_disabled_keeps_cloud_url() {
        let options = load(&[("TINYBIRD_LOCAL", "false"), ("TINYBIRD_PORT", "8080")]).unwrap();
        assert_eq!(options.base_url, ClientOptions::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let error = load(&[("TINYBIRD_MAX_RETRIES", "three")]).unwrap_err();
        let ConfigError::InvalidValue { name, value, .. } = error;
        assert_eq!(name, "TINYBIRD_MAX_RETRIES");
        assert_eq!(value, "three");
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let error = load(&[("TINYBIRD_LOCAL", "true"), ("TINYBIRD_PORT", "99999")]).unwrap_err();
        assert!(error.to_string().starts_with("invalid value for TINYBIRD_PORT"));
    }
}
