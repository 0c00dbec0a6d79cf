//! Tinybird Application - Request execution layer
//!
//! This crate turns logical API requests into Service calls:
//! - Port traits for the HTTP transport
//! - Request preparation and response classification
//! - Retry, batch and coordination logic

pub mod batch;
pub mod coordinator;
pub mod ports;
pub mod prepare;
pub mod response_parser;
pub mod retry;

#[cfg(test)]
mod test_support;

pub use batch::{BatchExecutor, BatchResults};
pub use coordinator::RequestCoordinator;
pub use indexmap::IndexMap;
pub use ports::{DispatchMode, Transport, TransportError};
pub use prepare::RequestPreparer;
pub use response_parser::ResponseParser;
pub use retry::RetryExecutor;
