//! OpenAI Chat Completions adapter
//!
//! Translates the neutral chat schema to `/chat/completions` and back.

use crate::adapters::ProviderAdapter;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{classify_status, DispatchError};
use crate::schemas::chat::{ChatRequest, ChatResponse, FinishReason, Role, TokenUsage};
use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole, CompletionUsage};
use crate::services::transport::{HttpReply, HttpRequest};

/// Adapter for OpenAI and OpenAI-compatible endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiAdapter;

impl OpenAiAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Build the wire request. The system prompt becomes a leading
    /// `system` message; conversation order is kept as-is.
    pub fn build_request(&self, config: &ProviderConfig, request: &ChatRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = request.system() {
            messages.push(ChatMessage {
                role: ChatRole::System,
                content: system.to_string(),
            });
        }

        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: match m.role {
                Role::User => ChatRole::User,
                Role::Assistant => ChatRole::Assistant,
            },
            content: m.content.clone(),
        }));

        ChatCompletionRequest {
            model: config.model().to_string(),
            messages,
            temperature: Some(config.temperature()),
            max_tokens: Some(config.max_tokens()),
        }
    }

    /// Map OpenAI's finish_reason. `None` means the value is unknown.
    fn convert_finish_reason(&self, reason: &str) -> Option<FinishReason> {
        match reason {
            "stop" | "tool_calls" | "function_call" => Some(FinishReason::Stop),
            "length" => Some(FinishReason::Length),
            "content_filter" => Some(FinishReason::Error),
            _ => None,
        }
    }

    fn convert_usage(&self, usage: Option<CompletionUsage>) -> Option<TokenUsage> {
        usage.map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn translate_request(
        &self,
        config: &ProviderConfig,
        request: &ChatRequest,
    ) -> Result<HttpRequest, DispatchError> {
        let body = serde_json::to_value(self.build_request(config, request)).map_err(|e| {
            DispatchError::configuration(format!("failed to encode OpenAI request: {}", e))
        })?;

        Ok(HttpRequest::new(format!("{}/chat/completions", config.base_url()), body)
            .with_header("Authorization", format!("Bearer {}", config.api_key().expose())))
    }

    fn translate_response(&self, reply: &HttpReply) -> Result<ChatResponse, DispatchError> {
        if !reply.is_success() {
            return Err(classify_status(reply.status, &reply.body));
        }

        let response: ChatCompletionResponse = serde_json::from_str(&reply.body).map_err(|e| {
            DispatchError::protocol(format!("invalid OpenAI response JSON: {}", e), &reply.body)
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::protocol("OpenAI response has no choices", &reply.body))?;

        let raw_reason = choice
            .finish_reason
            .as_deref()
            .ok_or_else(|| DispatchError::protocol("OpenAI response missing finish_reason", &reply.body))?;
        let finish_reason = self.convert_finish_reason(raw_reason).ok_or_else(|| {
            DispatchError::protocol(format!("unknown OpenAI finish_reason '{}'", raw_reason), &reply.body)
        })?;

        let usage = self.convert_usage(response.usage);

        if finish_reason == FinishReason::Error {
            return Ok(ChatResponse::failed(usage));
        }

        let message = choice
            .message
            .ok_or_else(|| DispatchError::protocol("OpenAI choice missing message", &reply.body))?;

        match (message.content, message.refusal) {
            (Some(content), _) => Ok(ChatResponse::completed(content, finish_reason, usage)),
            (None, Some(_)) => Ok(ChatResponse::failed(usage)),
            // Tool-call turns carry no text
            (None, None) if matches!(raw_reason, "tool_calls" | "function_call") => {
                Ok(ChatResponse::completed("", finish_reason, usage))
            }
            (None, None) => Err(DispatchError::protocol(
                "OpenAI message missing content",
                &reply.body,
            )),
        }
    }
}
