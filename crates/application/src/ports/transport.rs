//! Transport port

use std::future::Future;

use thiserror::Error;
use tinybird_domain::{PreparedRequest, TransportResponse};

/// Failures that happen before any HTTP response is received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport's timeout elapsed.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The target URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Anything else the transport reports.
    #[error("{0}")]
    Other(String),
}

/// How a transport can be driven by a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Many requests may be in flight at once; batches fan out.
    #[default]
    Concurrent,
    /// Requests must be sent one at a time; batches fall back to the
    /// sequential strategy, with full retries per item.
    Sequential,
}

/// Port for sending prepared requests to the Service.
///
/// Implementations own base URL resolution, authentication and timeouts.
/// A transport used in `Concurrent` mode must tolerate many `send` calls in
/// flight at once from different tasks.
pub trait Transport: Send + Sync + 'static {
    /// Sends one request and returns the raw response.
    ///
    /// Non-success statuses are responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if no response was received.
    fn send(
        &self,
        request: &PreparedRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;

    /// Reports whether this transport supports concurrent dispatch.
    fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::Concurrent
    }
}
