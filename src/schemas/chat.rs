//! Provider-neutral chat schema
//!
//! Callers build a [`ChatRequest`] and receive a [`ChatResponse`] with the same
//! shape whichever backend served it.

use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Request Types
// ============================================================================

/// Conversation role. System content travels separately in
/// [`ChatRequest::system_prompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Chat request. Message order is conversation order and is sent verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            system_prompt: None,
            messages,
        }
    }

    /// Single-turn request
    pub fn user(prompt: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(prompt)])
    }

    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn push(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Reject requests no backend could answer
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.messages.is_empty() {
            return Err(DispatchError::configuration(
                "chat request must contain at least one message",
            ));
        }
        Ok(())
    }

    /// System prompt, treating blank as absent
    pub fn system(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Why generation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of turn
    Stop,
    /// Hit max_tokens
    Length,
    /// Backend declined to answer (content filter, refusal)
    Error,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::Length => write!(f, "length"),
            FinishReason::Error => write!(f, "error"),
        }
    }
}

/// Token accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Normalized reply. When `finish_reason` is `Error`, `text` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawChatResponse")]
pub struct ChatResponse {
    text: String,
    finish_reason: FinishReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<TokenUsage>,
}

/// Wire form of [`ChatResponse`]; deserialization goes through
/// [`ChatResponse::completed`].
#[derive(Deserialize)]
struct RawChatResponse {
    #[serde(default)]
    text: String,
    finish_reason: FinishReason,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

impl From<RawChatResponse> for ChatResponse {
    fn from(raw: RawChatResponse) -> Self {
        ChatResponse::completed(raw.text, raw.finish_reason, raw.usage)
    }
}

impl ChatResponse {
    pub fn completed(
        text: impl Into<String>,
        finish_reason: FinishReason,
        usage: Option<TokenUsage>,
    ) -> Self {
        if finish_reason == FinishReason::Error {
            return Self::failed(usage);
        }
        Self {
            text: text.into(),
            finish_reason,
            usage,
        }
    }

    pub fn failed(usage: Option<TokenUsage>) -> Self {
        Self {
            text: String::new(),
            finish_reason: FinishReason::Error,
            usage,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn finish_reason(&self) -> FinishReason {
        self.finish_reason
    }

    pub fn usage(&self) -> Option<TokenUsage> {
        self.usage
    }
}
