//! Concurrent XML-RPC client.
//!
//! Calls are issued over an [`HttpTransport`](xmlrpc_transport::HttpTransport),
//! one POST each, and may complete in any order. Every call is tagged with a
//! sequence number; a dispatcher task routes each completed exchange back
//! to the caller that issued it. Batches go out as `system.multicall` and
//! come back split per sub-call.
//!
//! [`Client`] is async and runs on the caller's tokio runtime.
//! [`BlockingClient`] wraps it with a private runtime for synchronous code.

pub mod blocking;
pub mod client;
pub mod config;
mod correlation;
pub mod error;
pub mod multicall;

pub use blocking::BlockingClient;
pub use client::{Client, PendingCall};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use multicall::Destination;
