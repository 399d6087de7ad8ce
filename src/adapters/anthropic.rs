//! Anthropic Messages adapter

use crate::adapters::ProviderAdapter;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{classify_status, DispatchError};
use crate::schemas::anthropic::{Message, MessageRequest, MessageResponse, Usage, ANTHROPIC_VERSION};
use crate::schemas::chat::{ChatRequest, ChatResponse, FinishReason, Role, TokenUsage};
use crate::services::transport::{HttpReply, HttpRequest};

/// Adapter for the Anthropic Messages API (`x-api-key` auth, versioned header)
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicAdapter;

impl AnthropicAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Build the wire request. Anthropic takes the system prompt as a
    /// top-level field rather than a message.
    pub fn build_request(&self, config: &ProviderConfig, request: &ChatRequest) -> MessageRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| match m.role {
                Role::User => Message::user(m.content.clone()),
                Role::Assistant => Message::assistant(m.content.clone()),
            })
            .collect();

        let wire = MessageRequest::new(config.model(), messages, config.max_tokens())
            .with_temperature(config.temperature());

        match request.system() {
            Some(system) => wire.with_system(system),
            None => wire,
        }
    }

    fn convert_stop_reason(&self, reason: &str) -> Option<FinishReason> {
        match reason {
            "end_turn" | "stop_sequence" | "tool_use" | "pause_turn" => Some(FinishReason::Stop),
            "max_tokens" => Some(FinishReason::Length),
            "refusal" => Some(FinishReason::Error),
            _ => None,
        }
    }

    fn convert_usage(&self, usage: Option<Usage>) -> Option<TokenUsage> {
        usage.map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn translate_request(
        &self,
        config: &ProviderConfig,
        request: &ChatRequest,
    ) -> Result<HttpRequest, DispatchError> {
        let body = serde_json::to_value(self.build_request(config, request)).map_err(|e| {
            DispatchError::configuration(format!("failed to encode Anthropic request: {}", e))
        })?;

        Ok(HttpRequest::new(format!("{}/v1/messages", config.base_url()), body)
            .with_header("x-api-key", config.api_key().expose())
            .with_header("anthropic-version", ANTHROPIC_VERSION))
    }

    fn translate_response(&self, reply: &HttpReply) -> Result<ChatResponse, DispatchError> {
        if !reply.is_success() {
            return Err(classify_status(reply.status, &reply.body));
        }

        let response: MessageResponse = serde_json::from_str(&reply.body).map_err(|e| {
            DispatchError::protocol(format!("invalid Anthropic response JSON: {}", e), &reply.body)
        })?;

        if response.response_type.as_deref() == Some("error") {
            return Err(DispatchError::protocol(
                "Anthropic returned an error object with a success status",
                &reply.body,
            ));
        }

        let raw_reason = response
            .stop_reason
            .as_deref()
            .ok_or_else(|| DispatchError::protocol("Anthropic response missing stop_reason", &reply.body))?;
        let finish_reason = self.convert_stop_reason(raw_reason).ok_or_else(|| {
            DispatchError::protocol(format!("unknown Anthropic stop_reason '{}'", raw_reason), &reply.body)
        })?;

        let usage = self.convert_usage(response.usage);

        if finish_reason == FinishReason::Error {
            return Ok(ChatResponse::failed(usage));
        }

        let text = response
            .text()
            .ok_or_else(|| DispatchError::protocol("Anthropic response missing content", &reply.body))?;

        Ok(ChatResponse::completed(text, finish_reason, usage))
    }
}
