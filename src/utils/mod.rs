//! Utility modules
//!
//! Retry and timeout helpers for callers of the dispatcher.

pub mod retry;
pub mod timeout;

pub use retry::{presets, retry_transient, retry_with_backoff, RetryConfig, RetryResult};
pub use timeout::with_timeout;
