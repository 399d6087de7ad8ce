//! Provider dispatcher
//!
//! Routes a [`ChatRequest`] to the adapter selected by the configuration,
//! issues a single HTTP call and returns the normalized [`ChatResponse`].
//!
//! The dispatcher is stateless between calls: it never retries, caches or
//! logs. Callers own retry and timeout policy (see [`crate::utils`]).

use crate::adapters::{Adapter, ProviderAdapter};
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::DispatchError;
use crate::schemas::chat::{ChatRequest, ChatResponse};
use crate::services::transport::{HttpTransport, ReqwestTransport};
use std::sync::Arc;

/// Dispatches chat requests to the configured provider.
///
/// Cheap to clone; `send` takes `&self`, so one dispatcher can serve many
/// concurrent callers.
#[derive(Clone)]
pub struct ProviderDispatcher {
    config: Arc<ProviderConfig>,
    adapter: Adapter,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for ProviderDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDispatcher")
            .field("config", &self.config)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl ProviderDispatcher {
    /// Create a dispatcher backed by reqwest, using the configured timeout
    pub fn new(config: ProviderConfig) -> Result<Self, DispatchError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a dispatcher over any transport
    pub fn with_transport(config: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let adapter = Adapter::for_provider(config.provider());
        Self {
            config: Arc::new(config),
            adapter,
            transport,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn provider(&self) -> ProviderKind {
        self.adapter.kind()
    }

    /// Send one request.
    ///
    /// Fails with a configuration error before any network traffic when the
    /// request has no messages.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, DispatchError> {
        request.validate()?;

        let http_request = self.adapter.translate_request(&self.config, request)?;
        let reply = self.transport.post_json(&http_request).await?;

        self.adapter.translate_response(&reply)
    }
}

/// One-shot dispatch: build a reqwest-backed dispatcher for `config` and
/// send `request` through it.
pub async fn send(config: &ProviderConfig, request: &ChatRequest) -> Result<ChatResponse, DispatchError> {
    request.validate()?;
    ProviderDispatcher::new(config.clone())?.send(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::chat::FinishReason;
    use crate::services::stub::StubTransport;

    const OPENAI_OK: &str = r#"{
        "id": "chatcmpl-abc",
        "object": "chat.completion",
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Use a 4-3-3 with inverted full-backs to overload midfield."},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 18, "completion_tokens": 14, "total_tokens": 32}
    }"#;

    const ANTHROPIC_OK: &str = r#"{
        "id": "msg_abc",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-sonnet-latest",
        "content": [{"type": "text", "text": "Press the wing-backs."}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 18, "output_tokens": 5}
    }"#;

    fn openai_config() -> ProviderConfig {
        ProviderConfig::builder(ProviderKind::OpenAI, "sk-test")
            .model("gpt-4o")
            .temperature(0.7)
            .max_tokens(2000)
            .build()
            .unwrap()
    }

    fn anthropic_config() -> ProviderConfig {
        ProviderConfig::builder(ProviderKind::Anthropic, "sk-ant-test")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_openai_counter_formation_scenario() {
        let stub = Arc::new(StubTransport::replying(200, OPENAI_OK));
        let dispatcher = ProviderDispatcher::with_transport(openai_config(), stub.clone());

        let request = ChatRequest::user("What formation counters a 3-5-2?");
        let response = dispatcher.send(&request).await.unwrap();

        assert_eq!(stub.calls(), 1);
        assert!(!response.text().is_empty());
        assert_eq!(response.finish_reason(), FinishReason::Stop);

        let sent = stub.last_request().unwrap();
        assert!(sent.url.ends_with("/chat/completions"));
        assert_eq!(sent.body["messages"][0]["content"], "What formation counters a 3-5-2?");
        assert_eq!(sent.body["max_tokens"], 2000);
    }

    #[tokio::test]
    async fn test_routes_openai_config_only_to_openai() {
        let stub = Arc::new(StubTransport::replying(200, OPENAI_OK));
        let dispatcher = ProviderDispatcher::with_transport(openai_config(), stub.clone());
        assert_eq!(dispatcher.provider(), ProviderKind::OpenAI);

        dispatcher.send(&ChatRequest::user("hi")).await.unwrap();

        let sent = stub.last_request().unwrap();
        assert!(sent.header("authorization").is_some());
        assert!(sent.header("x-api-key").is_none());
        assert!(!sent.url.contains("/v1/messages"));
    }

    #[tokio::test]
    async fn test_routes_anthropic_config_only_to_anthropic() {
        let stub = Arc::new(StubTransport::replying(200, ANTHROPIC_OK));
        let dispatcher = ProviderDispatcher::with_transport(anthropic_config(), stub.clone());
        assert_eq!(dispatcher.provider(), ProviderKind::Anthropic);

        let response = dispatcher
            .send(&ChatRequest::user("How do I beat a back three?").with_system("You are TheGaffer."))
            .await
            .unwrap();
        assert_eq!(response.text(), "Press the wing-backs.");

        let sent = stub.last_request().unwrap();
        assert_eq!(sent.url, "https://api.anthropic.com/v1/messages");
        assert!(sent.header("x-api-key").is_some());
        assert!(sent.header("authorization").is_none());
        assert_eq!(sent.body["system"], "You are TheGaffer.");
    }

    #[tokio::test]
    async fn test_empty_request_never_reaches_network() {
        let stub = Arc::new(StubTransport::replying(200, OPENAI_OK));
        let dispatcher = ProviderDispatcher::with_transport(openai_config(), stub.clone());

        let err = dispatcher.send(&ChatRequest::default()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Configuration(_)));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_one_shot_send_rejects_empty_request() {
        let err = send(&openai_config(), &ChatRequest::default()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_authentication_not_transient() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let stub = Arc::new(StubTransport::replying(401, body));
        let dispatcher = ProviderDispatcher::with_transport(openai_config(), stub.clone());

        let err = dispatcher.send(&ChatRequest::user("hi")).await.unwrap_err();

        assert!(matches!(err, DispatchError::Authentication { status: 401, .. }));
        assert!(!err.is_retryable());
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let stub = Arc::new(StubTransport::failing(DispatchError::transient("connection reset")));
        let dispatcher = ProviderDispatcher::with_transport(anthropic_config(), stub.clone());

        let err = dispatcher.send(&ChatRequest::user("hi")).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_protocol_error_with_raw_payload() {
        let stub = Arc::new(StubTransport::replying(200, r#"{"unexpected": true}"#));
        let dispatcher = ProviderDispatcher::with_transport(openai_config(), stub);

        let err = dispatcher.send(&ChatRequest::user("hi")).await.unwrap_err();

        assert_eq!(err.kind(), "protocol_error");
        assert_eq!(err.raw_payload(), Some(r#"{"unexpected": true}"#));
    }

    #[tokio::test]
    async fn test_fixed_reply_normalizes_deterministically() {
        let stub = Arc::new(StubTransport::replying(200, OPENAI_OK));
        let dispatcher = ProviderDispatcher::with_transport(openai_config(), stub.clone());
        let request = ChatRequest::user("What formation counters a 3-5-2?");

        let first = dispatcher.send(&request).await.unwrap();
        let second = dispatcher.send(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(stub.calls(), 2);
    }

    mod over_http {
        use super::*;
        use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn test_openai_request_reaches_the_wire() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/chat/completions"))
                .and(matchers::header("authorization", "Bearer sk-test"))
                .and(matchers::body_partial_json(serde_json::json!({
                    "model": "gpt-4o",
                    "max_tokens": 2000,
                    "messages": [{"role": "user", "content": "What formation counters a 3-5-2?"}]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_string(OPENAI_OK))
                .expect(1)
                .mount(&mock_server)
                .await;

            let config = openai_config().with_base_url(mock_server.uri()).unwrap();
            let dispatcher = ProviderDispatcher::new(config).unwrap();

            let response = dispatcher
                .send(&ChatRequest::user("What formation counters a 3-5-2?"))
                .await
                .unwrap();
            assert_eq!(response.finish_reason(), FinishReason::Stop);
            assert!(response.text().contains("4-3-3"));
        }

        #[tokio::test]
        async fn test_anthropic_request_reaches_the_wire() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/v1/messages"))
                .and(matchers::header("x-api-key", "sk-ant-test"))
                .and(matchers::header("anthropic-version", "2023-06-01"))
                .and(matchers::body_partial_json(serde_json::json!({
                    "system": "You are TheGaffer."
                })))
                .respond_with(ResponseTemplate::new(200).set_body_string(ANTHROPIC_OK))
                .expect(1)
                .mount(&mock_server)
                .await;

            let config = anthropic_config().with_base_url(mock_server.uri()).unwrap();
            let dispatcher = ProviderDispatcher::new(config).unwrap();

            let response = dispatcher
                .send(&ChatRequest::user("How do I beat a back three?").with_system("You are TheGaffer."))
                .await
                .unwrap();
            assert_eq!(response.finish_reason(), FinishReason::Stop);
            assert_eq!(response.text(), "Press the wing-backs.");
        }

        #[tokio::test]
        async fn test_unauthorized_over_http_is_authentication() {
            let mock_server = MockServer::start().await;

            let error_body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/v1/messages"))
                .respond_with(ResponseTemplate::new(401).set_body_string(error_body))
                .expect(1)
                .mount(&mock_server)
                .await;

            let config = anthropic_config().with_base_url(mock_server.uri()).unwrap();
            let dispatcher = ProviderDispatcher::new(config).unwrap();

            let err = dispatcher.send(&ChatRequest::user("hi")).await.unwrap_err();
            match err {
                DispatchError::Authentication { status, message } => {
                    assert_eq!(status, 401);
                    assert!(message.contains("invalid x-api-key"));
                }
                other => panic!("Expected Authentication, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_server_error_over_http_is_transient() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/chat/completions"))
                .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
                .expect(1)
                .mount(&mock_server)
                .await;

            let config = openai_config().with_base_url(mock_server.uri()).unwrap();
            let dispatcher = ProviderDispatcher::new(config).unwrap();

            let err = dispatcher.send(&ChatRequest::user("hi")).await.unwrap_err();
            assert!(err.is_retryable());
        }
    }

    #[tokio::test]
    async fn test_concurrent_sends_share_one_dispatcher() {
        let stub = Arc::new(StubTransport::replying(200, ANTHROPIC_OK));
        let dispatcher = ProviderDispatcher::with_transport(anthropic_config(), stub.clone());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher
                        .send(&ChatRequest::user(format!("question {}", i)))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(stub.calls(), 8);
    }
}
