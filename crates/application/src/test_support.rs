//! Scripted transport for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tinybird_domain::{PreparedRequest, ResponseHeaders, TransportResponse};
use tokio::time::Instant;

use crate::ports::{DispatchMode, Transport, TransportError};

/// One scripted reply, optionally delayed.
struct Scripted {
    reply: Result<TransportResponse, TransportError>,
    delay: Duration,
}

/// Record of a call made to the scripted transport.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub key: String,
    pub request: PreparedRequest,
    pub at: Instant,
}

/// Transport answering from per-route FIFO queues of replies.
///
/// Routes are keyed `"{METHOD} {path}"`, with the path as prepared
/// (version prefix and query included).
#[derive(Clone)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    mode: DispatchMode,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::with_mode(DispatchMode::Concurrent)
    }

    pub fn with_mode(mode: DispatchMode) -> Self {
        Self {
            replies: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            mode,
        }
    }

    pub fn reply(&self, key: &str, status: u16, body: &str) -> &Self {
        self.push(key, Ok(TransportResponse::with_status(status, body)), Duration::ZERO)
    }

    pub fn reply_with_headers(
        &self,
        key: &str,
        status: u16,
        headers: &[(&str, &str)],
        body: &str,
    ) -> &Self {
        let headers: ResponseHeaders = headers.iter().copied().collect();
        self.push(
            key,
            Ok(TransportResponse::new(status, headers, body)),
            Duration::ZERO,
        )
    }

    pub fn reply_after(&self, key: &str, delay: Duration, status: u16, body: &str) -> &Self {
        self.push(key, Ok(TransportResponse::with_status(status, body)), delay)
    }

    pub fn fail(&self, key: &str, error: TransportError) -> &Self {
        self.push(key, Err(error), Duration::ZERO)
    }

    fn push(
        &self,
        key: &str,
        reply: Result<TransportResponse, TransportError>,
        delay: Duration,
    ) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(Scripted { reply, delay });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, key: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.key == key).collect()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<TransportResponse, TransportError> {
        let key = format!("{} {}", request.method, request.path);
        self.calls.lock().unwrap().push(RecordedCall {
            key: key.clone(),
            request: request.clone(),
            at: Instant::now(),
        });

        let scripted = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);

        match scripted {
            Some(Scripted { reply, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                reply
            }
            None => Err(TransportError::Other(format!(
                "no scripted reply for {key}"
            ))),
        }
    }

    fn dispatch_mode(&self) -> DispatchMode {
        self.mode
    }
}
