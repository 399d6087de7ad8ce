//! Application settings and configuration
//!
//! This module loads settings once at startup from environment variables
//! (and an optional `.env` file), with sensible defaults.

use crate::config::provider::{ApiKey, ProviderConfig, ProviderKind, DEFAULT_TIMEOUT_SECONDS};
use crate::error::DispatchError;
use crate::logging::LogFormat;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Identity of the agent server that embeds the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub version: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            name: "thegaffer".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerSettings {
    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Main application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub llm: ProviderConfig,
    pub server: ServerSettings,
    pub debug: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment
    pub fn load() -> Result<Self, DispatchError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DispatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider: ProviderKind = match get("LLM_PROVIDER") {
            Some(raw) => raw.parse()?,
            None => ProviderKind::OpenAI,
        };

        let api_key = get("LLM_API_KEY")
            .or_else(|| get(provider.api_key_env()))
            .ok_or_else(|| {
                DispatchError::configuration(format!(
                    "missing API key: set LLM_API_KEY or {}",
                    provider.api_key_env()
                ))
            })?;

        let model = get("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string());
        let temperature: f32 = parse_or("LLM_TEMPERATURE", get("LLM_TEMPERATURE"), 0.7)?;
        let max_tokens: u32 = parse_or("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS"), 2000)?;
        let timeout_secs: u64 = parse_or(
            "LLM_TIMEOUT_SECONDS",
            get("LLM_TIMEOUT_SECONDS"),
            DEFAULT_TIMEOUT_SECONDS,
        )?;

        let mut llm = ProviderConfig::new(provider, ApiKey::new(api_key), model, temperature, max_tokens)?
            .with_timeout((timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)));
        if let Some(base_url) = get("LLM_BASE_URL") {
            llm = llm.with_base_url(base_url)?;
        }

        let defaults = ServerSettings::default();
        let server = ServerSettings {
            host: get("MCP_HOST").unwrap_or(defaults.host),
            port: parse_or("MCP_PORT", get("MCP_PORT"), defaults.port)?,
            name: get("MCP_NAME").unwrap_or(defaults.name),
            version: get("MCP_VERSION").unwrap_or(defaults.version),
        };

        let settings = Self {
            llm,
            server,
            debug: get("DEBUG")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: match get("LOG_FORMAT") {
                Some(raw) => raw.parse()?,
                None => LogFormat::default(),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<(), DispatchError> {
        if self.server.port == 0 {
            return Err(DispatchError::configuration("MCP_PORT cannot be 0"));
        }
        Ok(())
    }

    /// Log filter to install: DEBUG forces `debug`
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

/// Parse an optional raw value, naming the variable on failure
fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, DispatchError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            DispatchError::configuration(format!("invalid {} value: '{}'", key, raw))
        }),
    }
}
