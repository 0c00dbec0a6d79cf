//! Single-request execution with bounded retries

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tinybird_domain::{JsonObject, PreparedRequest, RetryPolicy, ServiceError, TransportResponse, status};

use crate::ports::{Transport, TransportError};
use crate::response_parser::ResponseParser;

/// Runs one logical request, retrying transient failures.
///
/// Transport errors and the statuses in [`status::RETRYABLE_STATUS_CODES`]
/// are retried until `max_retries` attempts have been made. Any other failure
/// status, and any undecodable success body, fails immediately.
///
/// Waits between attempts are async timers, so they never hold up other
/// tasks. The first wait is `initial_delay × multiplier`; each later wait
/// multiplies the previous one again, unless the failing response carried a
/// positive integer `Retry-After`, which then replaces the delay.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    parser: Arc<ResponseParser>,
}

impl RetryExecutor {
    /// Creates an executor.
    #[must_use]
    pub const fn new(policy: RetryPolicy, parser: Arc<ResponseParser>) -> Self {
        Self { policy, parser }
    }

    /// Returns the policy in use.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends a prepared request through `transport` with retries.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn send<T: Transport>(
        &self,
        transport: &T,
        request: &PreparedRequest,
    ) -> Result<JsonObject, ServiceError> {
        self.execute(|| transport.send(request)).await
    }

    /// Runs `attempt` until it yields a success or a terminal failure.
    ///
    /// # Errors
    ///
    /// - `RequestTimeout` when the last attempt failed at the transport level
    /// - the typed status error when a non-retryable status arrives, or a
    ///   retryable one arrives on the last attempt
    /// - `Parse` when a success body is not a JSON object
    /// - `Api` with status 0 when the policy allows no attempts at all
    pub async fn execute<F, Fut>(&self, mut attempt: F) -> Result<JsonObject, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<TransportResponse, TransportError>>,
    {
        let max_retries = self.policy.max_retries;
        let mut delay = self.policy.initial_delay();

        for n in 0..max_retries {
            let can_retry = n + 1 < max_retries;

            let response = match attempt().await {
                Ok(response) => response,
                Err(error) if can_retry => {
                    delay = self.next_delay(delay, None);
                    tracing::warn!(
                        attempt = n + 1,
                        delay_ms = delay_ms(delay),
                        error = %error,
                        "transport error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(error) => {
                    tracing::warn!(attempt = n + 1, error = %error, "transport error, giving up");
                    return Err(ServiceError::request_timeout(error.to_string()));
                }
            };

            if self.parser.is_success(&response) {
                tracing::debug!(attempt = n + 1, status = response.status, "request succeeded");
                return Ok(self.parser.parse_body(&response)?);
            }

            if can_retry && status::is_retryable(response.status) {
                delay = self.next_delay(delay, Some(&response));
                tracing::warn!(
                    attempt = n + 1,
                    status = response.status,
                    delay_ms = delay_ms(delay),
                    "retryable status, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            tracing::debug!(attempt = n + 1, status = response.status, "request failed");
            return Err(self.parser.create_error(&response));
        }

        Err(ServiceError::api(0, "Max retries exceeded"))
    }

    /// Computes the wait before the next attempt.
    #[must_use]
    pub fn next_delay(&self, current: Duration, response: Option<&TransportResponse>) -> Duration {
        response
            .and_then(TransportResponse::retry_after_secs)
            .map_or_else(
                || current.saturating_mul(self.policy.backoff_multiplier),
                Duration::from_secs,
            )
    }
}

fn delay_ms(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
