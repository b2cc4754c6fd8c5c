//! Exchange Adapter
//!
//! JSON-RPC client for the Deribit-style exchange API: envelope types, the
//! HTTP transport, the token-caching session and the composed client.

pub mod client;
pub mod envelope;
pub mod error;
pub mod session;
pub mod transport;

pub use client::ExchangeClient;
pub use envelope::{ErrorObject, JSONRPC_VERSION, RpcRequest, RpcResponse};
pub use error::DeribitError;
pub use session::Session;
pub use transport::RpcTransport;
