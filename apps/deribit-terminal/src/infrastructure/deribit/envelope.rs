//! JSON-RPC Envelope Types
//!
//! Request and response wrappers exchanged with the exchange. Requests carry
//! a protocol version tag, a caller-assigned integer id, the method name and
//! a parameter object; responses echo the id and carry exactly one of
//! `result` or `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::DeribitError;

/// Protocol version tag sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Outbound RPC request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    /// Protocol version tag.
    pub jsonrpc: &'static str,
    /// Caller-assigned request id, echoed back by the exchange.
    pub id: u64,
    /// Method name, e.g. `private/buy`.
    pub method: String,
    /// Parameter object (string keys, scalar or nested values).
    pub params: Value,
}

impl RpcRequest {
    /// Create a new request envelope.
    #[must_use]
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// Error object inside a response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorObject {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

/// Inbound RPC response envelope.
///
/// A valid envelope carries exactly one of `result` or `error`; anything
/// else is a protocol violation surfaced by [`RpcResponse::into_outcome`].
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    /// Echoed request id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Success payload.
    #[serde(default)]
    pub result: Option<Value>,
    /// Error payload.
    #[serde(default)]
    pub error: Option<ErrorObject>,
}

impl RpcResponse {
    /// Parse a raw response body into an envelope.
    pub fn parse(body: &str) -> Result<Self, DeribitError> {
        serde_json::from_str(body)
            .map_err(|e| DeribitError::protocol(format!("invalid envelope: {e}"), body))
    }

    /// Resolve the envelope into its success value or a typed error.
    ///
    /// Verifies the echoed id matches the id that was sent; an envelope with
    /// neither `result` nor `error` (or both) is a protocol violation.
    pub fn into_outcome(self, expected_id: u64, raw: &str) -> Result<Value, DeribitError> {
        match (self.result, self.error) {
            (Some(_), Some(_)) => Err(DeribitError::protocol(
                "envelope carries both result and error",
                raw,
            )),
            (None, None) => Err(DeribitError::protocol(
                "envelope carries neither result nor error",
                raw,
            )),
            (None, Some(err)) => Err(DeribitError::Api {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => {
                if self.id == Some(expected_id) {
                    Ok(result)
                } else {
                    Err(DeribitError::protocol(
                        format!(
                            "response id {:?} does not match request id {expected_id}",
                            self.id
                        ),
                        raw,
                    ))
                }
            }
        }
    }
}
