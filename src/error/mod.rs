//! Error types
//!
//! The dispatcher reports every failure through [`DispatchError`]; recovery
//! policy (retry, fallback provider) is left to the caller.

pub mod types;

pub use types::{classify_status, DispatchError};
