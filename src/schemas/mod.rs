//! API schema definitions
//!
//! `chat` is the provider-neutral shape callers use; `openai` and
//! `anthropic` are the wire formats the adapters translate to and from.

pub mod anthropic;
pub mod chat;
pub mod openai;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, FinishReason, Role, TokenUsage};
