//! Transport implementation using reqwest.
//!
//! This adapter implements the `Transport` port on top of a shared
//! `reqwest::Client`. One client is built per transport and reused for every
//! request, so connections are pooled across concurrent batch items.

use reqwest::{Client, Method};
use tinybird_application::ports::{DispatchMode, Transport, TransportError};
use tinybird_domain::{ClientOptions, HttpMethod, PreparedRequest, ResponseHeaders, TransportResponse};
use url::Url;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("tinybird-rs/", env!("CARGO_PKG_VERSION"));

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    token: String,
    timeout_ms: u64,
    dispatch_mode: DispatchMode,
}

impl ReqwestTransport {
    /// Creates a transport from client options.
    ///
    /// Configuration:
    /// - Timeout: `options.timeout_secs`, for the whole request
    /// - gzip: negotiated only when `options.compression` is set
    /// - User-Agent: [`USER_AGENT`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the base URL does not parse, or `Other` if the
    /// client cannot be built.
    pub fn new(options: &ClientOptions) -> Result<Self, TransportError> {
        let timeout = options.timeout();
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(options.compression)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Self::with_client(client, options)
    }

    /// Creates a transport around an existing reqwest client.
    ///
    /// The client's own timeout and compression settings apply; `options`
    /// only supplies the base URL, the token and the timeout reported on errors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the base URL does not parse.
    pub fn with_client(client: Client, options: &ClientOptions) -> Result<Self, TransportError> {
        let base_url = options.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {base_url}")))?;

        Ok(Self {
            client,
            base_url,
            token: options.token.clone(),
            timeout_ms: u64::try_from(options.timeout().as_millis()).unwrap_or(u64::MAX),
            dispatch_mode: DispatchMode::Concurrent,
        })
    }

    /// Sets how batches are dispatched through this transport.
    #[must_use]
    pub const fn with_dispatch_mode(mut self, dispatch_mode: DispatchMode) -> Self {
        self.dispatch_mode = dispatch_mode;
        self
    }

    /// Returns the absolute URL for a prepared path.
    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let url = format!("{}{path}", self.base_url);
        Url::parse(&url).map_err(|e| TransportError::InvalidUrl(format!("{e}: {url}")))
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
        }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            return TransportError::Connection(error_chain(error));
        }

        TransportError::Other(error_chain(error))
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);

        if !self.token.is_empty() && !request.headers.contains("authorization") {
            builder = builder.bearer_auth(&self.token);
        }

        for header in request.headers.iter() {
            builder = builder.header(&header.name, &header.value);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        tracing::trace!(method = %request.method, path = %request.path, "sending");

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?;

        let status = response.status().as_u16();
        let headers: ResponseHeaders = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?
            .to_vec();

        tracing::trace!(status, bytes = body.len(), "received");

        Ok(TransportResponse::new(status, headers, body))
    }

    fn dispatch_mode(&self) -> DispatchMode {
        self.dispatch_mode
    }
}

/// Formats an error with its sources, which reqwest keeps out of `Display`.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
