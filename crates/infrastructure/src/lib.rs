//! Tinybird Infrastructure - Adapters and configuration
//!
//! This crate provides the concrete implementations behind the ports
//! defined in the application layer:
//! - `ReqwestTransport`, the HTTP transport
//! - `EnvConfig`, client options from `TINYBIRD_*` variables

pub mod adapters;
pub mod config;

pub use adapters::{ReqwestTransport, USER_AGENT};
pub use config::{ConfigError, EnvConfig};
