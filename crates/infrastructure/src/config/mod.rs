//! Client configuration loading

mod env;

pub use env::{ConfigError, EnvConfig};
