//! Canned-reply transport for tests

use crate::error::DispatchError;
use crate::services::transport::{HttpReply, HttpRequest, HttpTransport};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Returns the same reply for every call and records what was sent
pub struct StubTransport {
    reply: Result<HttpReply, DispatchError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn replying(status: u16, body: impl Into<String>) -> Self {
        Self::with_result(Ok(HttpReply::new(status, body)))
    }

    pub fn failing(err: DispatchError) -> Self {
        Self::with_result(Err(err))
    }

    fn with_result(reply: Result<HttpReply, DispatchError>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn post_json(&self, request: &HttpRequest) -> Result<HttpReply, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone()
    }
}
