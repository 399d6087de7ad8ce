//! HTTP transport for provider calls
//!
//! Adapters describe the outbound call as an [`HttpRequest`]; an
//! [`HttpTransport`] carries it. The production implementation is
//! [`ReqwestTransport`]; tests substitute a stub backend.

use crate::error::DispatchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

// ============================================================================
// Wire Envelope
// ============================================================================

/// A JSON POST to a provider endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a provider reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Issues exactly one HTTP call per invocation. Implementations hold no
/// per-call state and may be shared across tasks.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, request: &HttpRequest) -> Result<HttpReply, DispatchError>;
}

// ============================================================================
// Reqwest Transport
// ============================================================================

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport; `timeout` bounds the whole request
    pub fn new(timeout: Option<Duration>) -> Result<Self, DispatchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            DispatchError::configuration(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: &HttpRequest) -> Result<HttpReply, DispatchError> {
        let started = Instant::now();

        let mut builder = self.client.post(&request.url).json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!(url = %request.url, "Sending provider request");

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            DispatchError::transient(format!("failed to read response body: {}", e))
        })?;

        tracing::debug!(
            url = %request.url,
            status = status,
            latency_ms = started.elapsed().as_millis() as u64,
            "Provider request completed"
        );

        Ok(HttpReply { status, body })
    }
}

/// Builder/URL errors are misconfiguration; everything else on the way out
/// (connect, timeout, reset) is worth retrying.
fn map_reqwest_error(err: reqwest::Error) -> DispatchError {
    if err.is_builder() {
        return DispatchError::configuration(format!("invalid provider request: {}", err));
    }
    if err.is_timeout() {
        return DispatchError::transient(format!("request timed out: {}", err));
    }
    DispatchError::transient(format!("HTTP request failed: {}", err))
}
