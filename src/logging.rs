//! Logging utilities
//!
//! Installs the global tracing subscriber for the binary. The library itself
//! only emits events; it never installs a subscriber.

use crate::error::DispatchError;
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Text => write!(f, "text"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" | "compact" => Ok(LogFormat::Text),
            other => Err(DispatchError::configuration(format!(
                "invalid LOG_FORMAT '{}'. Expected: json or text",
                other
            ))),
        }
    }
}

/// Build the filter from RUST_LOG, falling back to the configured level
pub fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Initialize the tracing subscriber. Logs go to stderr so stdout carries
/// only the model reply.
pub fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = build_filter(log_level);

    let layer = match format {
        LogFormat::Json => tracing_fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Text => tracing_fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    // A subscriber may already be installed (e.g. by an embedding host)
    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        eprintln!("tracing subscriber already initialised; keeping existing one");
    }
}
