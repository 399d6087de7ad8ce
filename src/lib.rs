//! TheGaffer LLM dispatcher library
//!
//! Sends provider-neutral chat requests to OpenAI or Anthropic, selected by
//! configuration, and returns normalized responses or typed errors.

// Public modules
pub mod adapters;
pub mod config;
pub mod error;
pub mod logging;
pub mod schemas;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{ProviderConfig, ProviderKind, Settings};
pub use error::DispatchError;
pub use schemas::{ChatMessage, ChatRequest, ChatResponse, FinishReason, Role, TokenUsage};
pub use services::{send, ProviderDispatcher};
