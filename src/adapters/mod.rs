//! Provider adapters
//!
//! Each adapter translates the neutral [`ChatRequest`] into one provider's
//! wire request and that provider's reply back into a [`ChatResponse`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use gaffer_dispatch::adapters::{Adapter, ProviderAdapter};
//!
//! let adapter = Adapter::for_provider(config.provider());
//! let http_request = adapter.translate_request(&config, &chat_request)?;
//! // ... send http_request, receive reply ...
//! let chat_response = adapter.translate_response(&reply)?;
//! ```

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicAdapter;
pub use openai::OpenAiAdapter;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::DispatchError;
use crate::schemas::chat::{ChatRequest, ChatResponse};
use crate::services::transport::{HttpReply, HttpRequest};

/// Translation capability shared by every provider
pub trait ProviderAdapter {
    /// Provider this adapter speaks to
    fn kind(&self) -> ProviderKind;

    /// Neutral request -> provider HTTP request
    fn translate_request(
        &self,
        config: &ProviderConfig,
        request: &ChatRequest,
    ) -> Result<HttpRequest, DispatchError>;

    /// Provider HTTP reply -> neutral response. Non-2xx statuses become
    /// typed errors.
    fn translate_response(&self, reply: &HttpReply) -> Result<ChatResponse, DispatchError>;
}

/// The adapter selected for a configuration
#[derive(Debug, Clone, Copy)]
pub enum Adapter {
    OpenAi(OpenAiAdapter),
    Anthropic(AnthropicAdapter),
}

impl Adapter {
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::OpenAI => Adapter::OpenAi(OpenAiAdapter::new()),
            ProviderKind::Anthropic => Adapter::Anthropic(AnthropicAdapter::new()),
        }
    }

    fn ensure_matches(&self, config: &ProviderConfig) -> Result<(), DispatchError> {
        if config.provider() != self.kind() {
            return Err(DispatchError::configuration(format!(
                "{} adapter cannot serve a {} configuration",
                self.kind(),
                config.provider()
            )));
        }
        Ok(())
    }
}

impl ProviderAdapter for Adapter {
    fn kind(&self) -> ProviderKind {
        match self {
            Adapter::OpenAi(a) => a.kind(),
            Adapter::Anthropic(a) => a.kind(),
        }
    }

    fn translate_request(
        &self,
        config: &ProviderConfig,
        request: &ChatRequest,
    ) -> Result<HttpRequest, DispatchError> {
        self.ensure_matches(config)?;
        match self {
            Adapter::OpenAi(a) => a.translate_request(config, request),
            Adapter::Anthropic(a) => a.translate_request(config, request),
        }
    }

    fn translate_response(&self, reply: &HttpReply) -> Result<ChatResponse, DispatchError> {
        match self {
            Adapter::OpenAi(a) => a.translate_response(reply),
            Adapter::Anthropic(a) => a.translate_response(reply),
        }
    }
}
