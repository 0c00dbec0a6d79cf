//! Keyed batch execution

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use tinybird_domain::{ApiRequest, BatchResult, JsonObject, PreparedRequest, ServiceError};
use tokio::task::{JoinError, JoinHandle};
use tracing::Instrument;

use crate::ports::{DispatchMode, Transport};
use crate::prepare::RequestPreparer;
use crate::response_parser::ResponseParser;
use crate::retry::RetryExecutor;

/// Per-key outcomes of a batch, in submission order.
pub type BatchResults<K> = IndexMap<K, BatchResult<JsonObject>>;

/// Executes keyed sets of requests, isolating failures per item.
///
/// With a [`DispatchMode::Concurrent`] transport every item is dispatched
/// before any is awaited, and each item gets exactly one attempt: retryable
/// statuses and transport errors are reported, not retried. With a
/// [`DispatchMode::Sequential`] transport items run one after another through
/// the [`RetryExecutor`], so each gets the full retry policy.
///
/// Either way the result holds exactly one entry per input key.
pub struct BatchExecutor<T: Transport> {
    transport: Arc<T>,
    preparer: RequestPreparer,
    parser: Arc<ResponseParser>,
    retry: RetryExecutor,
}

impl<T: Transport> BatchExecutor<T> {
    /// Creates a batch executor over `transport`.
    pub const fn new(
        transport: Arc<T>,
        preparer: RequestPreparer,
        parser: Arc<ResponseParser>,
        retry: RetryExecutor,
    ) -> Self {
        Self {
            transport,
            preparer,
            parser,
            retry,
        }
    }

    /// Runs every request and returns one outcome per key.
    ///
    /// Never fails as a whole. A request that cannot be prepared fails its
    /// own slot without being sent.
    pub async fn execute<K>(&self, requests: IndexMap<K, ApiRequest>) -> BatchResults<K>
    where
        K: Eq + Hash,
    {
        let mode = self.transport.dispatch_mode();
        tracing::debug!(items = requests.len(), ?mode, "executing batch");

        match mode {
            DispatchMode::Concurrent => self.execute_concurrent(requests).await,
            DispatchMode::Sequential => self.execute_sequential(requests).await,
        }
    }

    async fn execute_concurrent<K>(&self, requests: IndexMap<K, ApiRequest>) -> BatchResults<K>
    where
        K: Eq + Hash,
    {
        // Dispatch phase: every prepared item is in flight before any is awaited.
        let slots: Vec<(K, Slot)> = requests
            .into_iter()
            .enumerate()
            .map(|(index, (key, request))| {
                let slot = match self.preparer.prepare(&request) {
                    Ok(prepared) => Slot::Pending(self.dispatch(index, prepared)),
                    Err(error) => Slot::Ready(error),
                };
                (key, slot)
            })
            .collect();

        // Collection phase, in submission order.
        let mut results = BatchResults::with_capacity(slots.len());
        for (key, slot) in slots {
            let outcome = match slot {
                Slot::Ready(error) => Err(error),
                Slot::Pending(task) => task.join().await,
            };
            results.insert(key, BatchResult::from(outcome));
        }

        tracing::debug!(
            failures = results.values().filter(|r| r.is_failure()).count(),
            "batch completed"
        );
        results
    }

    fn dispatch(&self, index: usize, prepared: PreparedRequest) -> AbortOnDrop {
        let transport = Arc::clone(&self.transport);
        let parser = Arc::clone(&self.parser);
        let path = prepared.path.clone();

        spawn_item(index, &path, async move {
            match transport.send(&prepared).await {
                Ok(response) => parser.parse(&response),
                Err(error) => {
                    tracing::debug!(error = %error, "transport error");
                    Err(ServiceError::request_timeout(error.to_string()))
                }
            }
        })
    }

    async fn execute_sequential<K>(&self, requests: IndexMap<K, ApiRequest>) -> BatchResults<K>
    where
        K: Eq + Hash,
    {
        let mut results = BatchResults::with_capacity(requests.len());

        // Each item runs in its own task, joined before the next one starts.
        for (index, (key, request)) in requests.into_iter().enumerate() {
            let outcome = match self.preparer.prepare(&request) {
                Ok(prepared) => {
                    let transport = Arc::clone(&self.transport);
                    let retry = self.retry.clone();
                    let path = prepared.path.clone();
                    spawn_item(index, &path, async move {
                        retry.send(transport.as_ref(), &prepared).await
                    })
                    .join()
                    .await
                }
                Err(error) => Err(error),
            };
            results.insert(key, BatchResult::from(outcome));
        }

        results
    }
}

fn spawn_item<F>(index: usize, path: &str, item: F) -> AbortOnDrop
where
    F: Future<Output = Result<JsonObject, ServiceError>> + Send + 'static,
{
    let span = tracing::debug_span!("batch_item", index, path = %path);
    AbortOnDrop(tokio::spawn(item.instrument(span)))
}

enum Slot {
    Ready(ServiceError),
    Pending(AbortOnDrop),
}

/// Spawned batch item, aborted if the batch future is dropped before it is joined.
struct AbortOnDrop(JoinHandle<Result<JsonObject, ServiceError>>);

impl AbortOnDrop {
    async fn join(mut self) -> Result<JsonObject, ServiceError> {
        (&mut self.0).await.unwrap_or_else(|error| Err(join_failure(&error)))
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn join_failure(error: &JoinError) -> ServiceError {
    let message = if error.is_panic() {
        "batch item task panicked".to_string()
    } else {
        format!("batch item task did not complete: {error}")
    };
    tracing::error!(%message, "batch item lost");
    ServiceError::Internal { message }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::TransportError;
    use crate::test_support::ScriptedTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use tinybird_domain::{RetryPolicy, TransportResponse};
    use tokio::time::Instant;

    fn executor<T: Transport>(transport: T) -> BatchExecutor<T> {
        let parser = Arc::new(ResponseParser::default());
        BatchExecutor::new(
            Arc::new(transport),
            RequestPreparer::new("v0"),
            Arc::clone(&parser),
            RetryExecutor::new(RetryPolicy::new(3, 100, 2), parser),
        )
    }

    fn batch(keys: &[&'static str]) -> IndexMap<&'static str, ApiRequest> {
        keys.iter()
            .map(|key| (*key, ApiRequest::get(*key)))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_isolated_per_key() {
        let transport = ScriptedTransport::new();
        transport.reply("GET /v0/a", 200, r#"{"a": 1}"#);
        transport.reply("GET /v0/b", 500, r#"{"error": "boom"}"#);
        transport.reply("GET /v0/b", 200, "{}");

        let results = executor(transport.clone()).execute(batch(&["a", "b"])).await;

        assert_eq!(results["a"].data().unwrap().get("a"), Some(&json!(1)));
        let error = results["b"].error().unwrap();
        assert!(matches!(error, ServiceError::Api(e) if e.status == 500));
        assert_eq!(transport.calls_to("GET /v0/b").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_fails_only_its_slot() {
        let transport = ScriptedTransport::new();
        let keys = ["k1", "k2", "k3", "k4", "k5"];
        for key in keys {
            if key == "k3" {
                transport.fail(
                    "GET /v0/k3",
                    TransportError::Connection("refused".to_string()),
                );
            } else {
                transport.reply(&format!("GET /v0/{key}"), 200, r#"{"ok": true}"#);
            }
        }

        let results = executor(transport.clone()).execute(batch(&keys)).await;

        assert_eq!(results.len(), 5);
        for key in keys {
            assert_eq!(results[key].is_failure(), key == "k3", "slot {key}");
        }
        assert!(matches!(
            results["k3"].error(),
            Some(ServiceError::RequestTimeout { .. })
        ));
        assert_eq!(transport.calls().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preparation_failure_is_not_sent() {
        let transport = ScriptedTransport::new();
        transport.reply("GET /v0/good", 200, "{}");
        let mut requests = batch(&["good"]);
        requests.insert("bad", ApiRequest::get("bad").with_header("Bad Header", "x"));

        let results = executor(transport.clone()).execute(requests).await;

        assert!(results["good"].is_success());
        assert!(matches!(
            results["bad"].error(),
            Some(ServiceError::InvalidRequest { .. })
        ));
        assert!(transport.calls_to("GET /v0/bad").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_key_has_a_result_when_all_fail() {
        let transport = ScriptedTransport::new();
        transport.reply("GET /v0/a", 401, "{}");
        transport.reply("GET /v0/b", 429, "{}");
        transport.reply("GET /v0/c", 200, "not json");

        let results = executor(transport).execute(batch(&["a", "b", "c"])).await;

        assert!(matches!(results["a"].error(), Some(ServiceError::Authentication(_))));
        assert!(matches!(results["b"].error(), Some(ServiceError::RateLimit(_))));
        assert!(matches!(results["c"].error(), Some(ServiceError::Parse(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_submission_order() {
        let transport = ScriptedTransport::new();
        transport.reply_after("GET /v0/slow", Duration::from_secs(3), 200, "{}");
        transport.reply_after("GET /v0/fast", Duration::from_secs(1), 200, "{}");
        transport.reply("GET /v0/instant", 200, "{}");

        let results = executor(transport)
            .execute(batch(&["slow", "fast", "instant"]))
            .await;

        assert_eq!(
            results.keys().copied().collect::<Vec<_>>(),
            vec!["slow", "fast", "instant"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_items_are_in_flight_together() {
        let transport = ScriptedTransport::new();
        for key in ["a", "b", "c"] {
            transport.reply_after(&format!("GET /v0/{key}"), Duration::from_secs(1), 200, "{}");
        }

        let started = Instant::now();
        let results = executor(transport).execute(batch(&["a", "b", "c"])).await;

        assert!(results.values().all(BatchResult::is_success));
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch() {
        let results = executor(ScriptedTransport::new())
            .execute(IndexMap::<String, ApiRequest>::new())
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_mode_retries_each_item() {
        let transport = ScriptedTransport::with_mode(DispatchMode::Sequential);
        transport.reply("GET /v0/a", 500, "");
        transport.reply("GET /v0/a", 500, "");
        transport.reply("GET /v0/a", 200, r#"{"a": 1}"#);
        transport.reply("GET /v0/b", 400, r#"{"error": "bad"}"#);
        transport.reply("GET /v0/c", 200, r#"{"c": 3}"#);

        let results = executor(transport.clone())
            .execute(batch(&["a", "b", "c"]))
            .await;

        assert!(results["a"].is_success());
        assert_eq!(transport.calls_to("GET /v0/a").len(), 3);
        assert_eq!(results["b"].error().and_then(ServiceError::status_code), Some(400));
        assert_eq!(results["c"].data().unwrap().get("c"), Some(&json!(3)));

        let order: Vec<String> = transport.calls().into_iter().map(|c| c.key).collect();
        assert_eq!(
            order,
            vec!["GET /v0/a", "GET /v0/a", "GET /v0/a", "GET /v0/b", "GET /v0/c"]
        );
    }

    struct PanickingTransport(DispatchMode);

    impl Transport for PanickingTransport {
        #[allow(clippy::panic)]
        async fn send(
            &self,
            request: &PreparedRequest,
        ) -> Result<TransportResponse, TransportError> {
            if request.path.ends_with("boom") {
                panic!("transport blew up");
            }
            Ok(TransportResponse::with_status(200, "{}"))
        }

        fn dispatch_mode(&self) -> DispatchMode {
            self.0
        }
    }

    #[tokio::test]
    async fn test_panicking_item_becomes_internal_failure() {
        let results = executor(PanickingTransport(DispatchMode::Concurrent))
            .execute(batch(&["fine", "boom"]))
            .await;

        assert!(results["fine"].is_success());
        assert!(matches!(
            results["boom"].error(),
            Some(ServiceError::Internal { .. })
        ));
    }

    #[tokio::test]
    async fn test_sequential_panicking_item_does_not_stop_the_batch() {
        let results = executor(PanickingTransport(DispatchMode::Sequential))
            .execute(batch(&["boom", "fine"]))
            .await;

        assert_eq!(results.len(), 2);
        assert!(matches!(
            results["boom"].error(),
            Some(ServiceError::Internal { .. })
        ));
        assert!(results["fine"].is_success());
    }
}
