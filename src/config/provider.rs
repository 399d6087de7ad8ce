//! Provider selection and per-call LLM parameters
//!
//! [`ProviderConfig`] is validated once at construction and is read-only
//! afterwards; an invalid configuration cannot be represented.

use crate::error::DispatchError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

/// Default request timeout for the HTTP transport
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Sampling temperatures the backend accepts
    pub fn temperature_range(&self) -> RangeInclusive<f32> {
        match self {
            ProviderKind::OpenAI => 0.0..=2.0,
            ProviderKind::Anthropic => 0.0..=1.0,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o",
            ProviderKind::Anthropic => "claude-3-5-sonnet-latest",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
        }
    }

    /// Provider-specific credential variable, consulted when LLM_API_KEY is unset
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(DispatchError::configuration(format!(
                "unsupported LLM provider '{}'. Expected: openai or anthropic",
                other
            ))),
        }
    }
}

/// Backend credential. Never printed, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building the auth header
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Validated, immutable LLM configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    provider: ProviderKind,
    api_key: ApiKey,
    model: String,
    temperature: f32,
    max_tokens: u32,
    base_url: String,
    timeout: Option<Duration>,
}

impl ProviderConfig {
    /// Build a configuration, rejecting anything the backend would refuse.
    ///
    /// Out-of-range temperatures are an error rather than being clamped.
    pub fn new(
        provider: ProviderKind,
        api_key: ApiKey,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self, DispatchError> {
        let config = Self {
            provider,
            api_key,
            model: model.into(),
            temperature,
            max_tokens,
            base_url: provider.default_base_url().to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
        };
        config.validate()?;
        Ok(config)
    }

    /// Start from provider defaults (model, temperature 0.7, 2000 tokens)
    pub fn builder(provider: ProviderKind, api_key: impl Into<String>) -> ProviderConfigBuilder {
        ProviderConfigBuilder {
            provider,
            api_key: ApiKey::new(api_key),
            model: provider.default_model().to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            base_url: None,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
        }
    }

    /// Point at an OpenAI- or Anthropic-compatible gateway
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, DispatchError> {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self.validate()?;
        Ok(self)
    }

    /// Transport-level timeout; `None` waits indefinitely
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn validate(&self) -> Result<(), DispatchError> {
        if self.api_key.is_blank() {
            return Err(DispatchError::configuration(format!(
                "missing API key for provider {}",
                self.provider
            )));
        }

        if self.model.trim().is_empty() {
            return Err(DispatchError::configuration("model must not be empty"));
        }

        let range = self.provider.temperature_range();
        if !self.temperature.is_finite() || !range.contains(&self.temperature) {
            return Err(DispatchError::configuration(format!(
                "temperature {} out of range [{}, {}] for provider {}",
                self.temperature,
                range.start(),
                range.end(),
                self.provider
            )));
        }

        if self.max_tokens == 0 {
            return Err(DispatchError::configuration("max_tokens must be > 0"));
        }

        if self.base_url.trim().is_empty() {
            return Err(DispatchError::configuration("base URL must not be empty"));
        }

        Ok(())
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`ProviderConfig`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ProviderConfigBuilder {
    provider: ProviderKind,
    api_key: ApiKey,
    model: String,
    temperature: f32,
    max_tokens: u32,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl ProviderConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ProviderConfig, DispatchError> {
        let config = ProviderConfig::new(
            self.provider,
            self.api_key,
            self.model,
            self.temperature,
            self.max_tokens,
        )?
        .with_timeout(self.timeout);

        match self.base_url {
            Some(url) => config.with_base_url(url),
            None => Ok(config),
        }
    }
}
