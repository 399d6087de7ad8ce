//! Dispatch error types

use thiserror::Error;

/// Longest slice of a backend payload quoted in an error message.
const MAX_QUOTED_BODY: usize = 512;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// Bad or missing provider, credential, model, or out-of-range parameter.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backend rejected the credential.
    #[error("Authentication error ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// Network failure, timeout, rate limit or backend overload. Safe to retry.
    #[error("Transient error: {0}")]
    Transient(String),

    /// The backend reply did not have the expected shape.
    #[error("Protocol error: {message}")]
    Protocol { message: String, raw: String },
}

impl DispatchError {
    pub fn configuration(message: impl Into<String>) -> Self {
        DispatchError::Configuration(message.into())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        DispatchError::Transient(message.into())
    }

    pub fn protocol(message: impl Into<String>, raw: impl Into<String>) -> Self {
        DispatchError::Protocol {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Whether a caller may safely repeat the call
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Transient(_))
    }

    /// Stable label for logs and exit messages
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Configuration(_) => "configuration_error",
            DispatchError::Authentication { .. } => "authentication_error",
            DispatchError::Transient(_) => "transient_error",
            DispatchError::Protocol { .. } => "protocol_error",
        }
    }

    /// Raw backend payload, when one was received
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            DispatchError::Protocol { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Map a non-success HTTP status from a provider into a [`DispatchError`].
///
/// Both OpenAI and Anthropic wrap failures as `{"error": {"message": ...}}`,
/// so the message is pulled from there when the body parses.
pub fn classify_status(status: u16, body: &str) -> DispatchError {
    let message = extract_error_message(body).unwrap_or_else(|| quote_body(body));

    match status {
        401 | 403 => DispatchError::Authentication { status, message },
        408 | 409 | 425 | 429 | 500..=599 => {
            DispatchError::Transient(format!("backend returned {}: {}", status, message))
        }
        400 | 404 | 422 => DispatchError::Configuration(format!(
            "backend rejected request ({}): {}",
            status, message
        )),
        _ => DispatchError::protocol(format!("unexpected HTTP status {}", status), body),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

fn quote_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    match trimmed.char_indices().nth(MAX_QUOTED_BODY) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
