//! Services module
//!
//! Outbound provider calls: the HTTP transport and the dispatcher built on it.

pub mod dispatcher;
pub mod transport;

#[cfg(test)]
pub(crate) mod stub;

pub use dispatcher::{send, ProviderDispatcher};
pub use transport::{HttpReply, HttpRequest, HttpTransport, ReqwestTransport};
