//! gaffer-dispatch
//!
//! Sends one prompt to the configured LLM provider and prints the reply.

use anyhow::{Context, Result};
use clap::Parser;
use gaffer_dispatch::{
    config::{ProviderKind, Settings},
    logging::{init_tracing, LogFormat},
    utils::{presets, retry_transient, with_timeout},
    ChatRequest, ChatResponse, DispatchError, FinishReason, ProviderDispatcher,
};
use std::collections::HashMap;
use std::env;
use std::io::Read;
use std::time::Duration;

/// Send a prompt to OpenAI or Anthropic
///
/// Configuration comes from LLM_* environment variables (and .env);
/// flags override them.
#[derive(Parser, Debug)]
#[command(name = "gaffer-dispatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Prompt text; read from stdin when omitted or "-"
    prompt: Vec<String>,

    /// LLM provider (overrides LLM_PROVIDER)
    #[arg(short, long, value_enum)]
    provider: Option<ProviderKind>,

    /// Model identifier (overrides LLM_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature (overrides LLM_TEMPERATURE)
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Response length cap (overrides LLM_MAX_TOKENS)
    #[arg(long)]
    max_tokens: Option<u32>,

    /// API root for compatible gateways (overrides LLM_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// System prompt
    #[arg(short, long)]
    system: Option<String>,

    /// Retries on transient failures (rate limits, timeouts, 5xx)
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Overall deadline per attempt, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (overrides LOG_FORMAT)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    /// CLI flags expressed as the environment keys they override
    fn overrides(&self) -> HashMap<&'static str, String> {
        let mut map = HashMap::new();
        if let Some(provider) = self.provider {
            map.insert("LLM_PROVIDER", provider.to_string());
        }
        if let Some(model) = &self.model {
            map.insert("LLM_MODEL", model.clone());
        }
        if let Some(temperature) = self.temperature {
            map.insert("LLM_TEMPERATURE", temperature.to_string());
        }
        if let Some(max_tokens) = self.max_tokens {
            map.insert("LLM_MAX_TOKENS", max_tokens.to_string());
        }
        if let Some(base_url) = &self.base_url {
            map.insert("LLM_BASE_URL", base_url.clone());
        }
        if let Some(level) = &self.log_level {
            map.insert("LOG_LEVEL", level.clone());
        }
        if let Some(format) = self.log_format {
            map.insert("LOG_FORMAT", format.to_string());
        }
        map
    }

    fn read_prompt(&self) -> Result<String> {
        let joined = self.prompt.join(" ");
        if !joined.trim().is_empty() && joined != "-" {
            return Ok(joined);
        }

        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read prompt from stdin")?;
        Ok(buf)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load .env before reading the environment
    dotenvy::dotenv().ok();

    let overrides = args.overrides();
    let settings = match Settings::from_lookup(|key| {
        overrides.get(key).cloned().or_else(|| env::var(key).ok())
    }) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}: {}", e.kind(), e);
            std::process::exit(2);
        }
    };

    init_tracing(settings.effective_log_level(), settings.log_format);

    tracing::info!(
        name = %settings.server.name,
        version = %settings.server.version,
        provider = %settings.llm.provider(),
        model = %settings.llm.model(),
        "Starting dispatcher"
    );

    let prompt = args.read_prompt()?;
    let mut request = match prompt_request(&prompt) {
        Ok(request) => request,
        Err(e) => return fail(e),
    };
    if let Some(system) = &args.system {
        request = request.with_system(system.clone());
    }

    let dispatcher = match ProviderDispatcher::new(settings.llm.clone()) {
        Ok(dispatcher) => dispatcher,
        Err(e) => return fail(e),
    };
    let retry_config = presets::llm().with_max_retries(args.retries);
    let deadline = args.timeout_secs.map(Duration::from_secs);

    let result = retry_transient(&retry_config, || {
        let dispatcher = dispatcher.clone();
        let request = request.clone();
        async move {
            match deadline {
                Some(deadline) => with_timeout(deadline, dispatcher.send(&request)).await,
                None => dispatcher.send(&request).await,
            }
        }
    })
    .await;

    match result {
        Ok(response) => report(response),
        Err(e) => fail(e),
    }
}

/// A blank prompt is rejected here rather than sent as an empty message
fn prompt_request(prompt: &str) -> Result<ChatRequest, DispatchError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(DispatchError::configuration(
            "prompt is empty; pass it as an argument or on stdin",
        ));
    }
    Ok(ChatRequest::user(prompt))
}

fn report(response: ChatResponse) -> Result<()> {
    if let Some(usage) = response.usage() {
        tracing::info!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            finish_reason = %response.finish_reason(),
            "Request completed"
        );
    }

    match response.finish_reason() {
        FinishReason::Error => {
            eprintln!("The provider declined to answer this request.");
            std::process::exit(1);
        }
        FinishReason::Length => {
            tracing::warn!("Reply truncated at max_tokens");
            println!("{}", response.text());
        }
        FinishReason::Stop => println!("{}", response.text()),
    }

    Ok(())
}

fn fail(err: DispatchError) -> Result<()> {
    tracing::error!(kind = err.kind(), error = %err, "Request failed");
    if let Some(raw) = err.raw_payload() {
        tracing::debug!(raw = %raw, "Raw provider payload");
    }
    eprintln!("{}: {}", err.kind(), err);
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_prompt_is_rejected_locally() {
        for prompt in ["", "   ", "\n\t"] {
            let err = prompt_request(prompt).unwrap_err();
            assert_eq!(err.kind(), "configuration_error");
        }
    }

    #[test]
    fn test_prompt_is_trimmed() {
        let request = prompt_request("  What formation counters a 3-5-2?\n").unwrap();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "What formation counters a 3-5-2?");
    }
}
