//! Request Coordinator
//!
//! The entry point for callers: owns the transport and wires preparation,
//! retries and batching together.

use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use tinybird_domain::{
    ApiRequest, ClientOptions, JsonObject, QueryParams, RequestBody, ServiceError,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::batch::{BatchExecutor, BatchResults};
use crate::ports::{DispatchMode, Transport};
use crate::prepare::RequestPreparer;
use crate::response_parser::ResponseParser;
use crate::retry::RetryExecutor;

/// Executes requests against the Service.
///
/// # Example
///
/// ```ignore
/// let options = ClientOptions::new().with_token("p.xxx");
/// let transport = ReqwestTransport::new(&options)?;
/// let coordinator = RequestCoordinator::new(&options, Arc::new(transport));
///
/// let rows = coordinator.get("sql", [("q", "SELECT 1")].into_iter().collect()).await?;
/// ```
pub struct RequestCoordinator<T: Transport> {
    transport: Arc<T>,
    preparer: RequestPreparer,
    retry: RetryExecutor,
    batch: BatchExecutor<T>,
}

impl<T: Transport> RequestCoordinator<T> {
    /// Creates a coordinator from client options and a transport.
    ///
    /// The options are read once; later changes to them have no effect.
    pub fn new(options: &ClientOptions, transport: Arc<T>) -> Self {
        let parser = Arc::new(ResponseParser::new(options.token.clone()));
        let preparer = RequestPreparer::new(options.api_version.clone());
        let retry = RetryExecutor::new(options.retry, Arc::clone(&parser));
        let batch = BatchExecutor::new(
            Arc::clone(&transport),
            preparer.clone(),
            parser,
            retry.clone(),
        );

        Self {
            transport,
            preparer,
            retry,
            batch,
        }
    }

    /// How batches are dispatched by the underlying transport.
    pub fn dispatch_mode(&self) -> DispatchMode {
        self.transport.dispatch_mode()
    }

    /// Executes one request with the configured retry policy.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the request cannot be encoded, otherwise
    /// whatever the retry loop ends with.
    pub async fn request(&self, request: &ApiRequest) -> Result<JsonObject, ServiceError> {
        let span = tracing::info_span!(
            "tinybird_request",
            request_id = %Uuid::now_v7(),
            method = %request.method,
            path = %request.path,
        );

        async {
            let prepared = self.preparer.prepare(request)?;
            let result = self.retry.send(self.transport.as_ref(), &prepared).await;
            if let Err(error) = &result {
                tracing::info!(error = %error, "request failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Executes a GET request.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub async fn get(
        &self,
        path: impl Into<String>,
        query: QueryParams,
    ) -> Result<JsonObject, ServiceError> {
        self.request(&ApiRequest::get(path).with_query(query)).await
    }

    /// Executes a POST request.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub async fn post(
        &self,
        path: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<JsonObject, ServiceError> {
        self.request(&ApiRequest::post(path, body)).await
    }

    /// Executes a keyed set of requests, one outcome per key.
    ///
    /// Retry behavior depends on [`Self::dispatch_mode`]: concurrent batches
    /// make a single attempt per item, sequential batches apply the full
    /// retry policy to each item. See [`BatchExecutor`].
    pub async fn batch<K>(&self, requests: IndexMap<K, ApiRequest>) -> BatchResults<K>
    where
        K: Eq + Hash,
    {
        let span = tracing::info_span!(
            "tinybird_batch",
            request_id = %Uuid::now_v7(),
            items = requests.len(),
        );
        self.batch.execute(requests).instrument(span).await
    }
}
