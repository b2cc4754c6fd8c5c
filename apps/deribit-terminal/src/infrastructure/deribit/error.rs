//! Exchange-specific error types.

use thiserror::Error;

/// Errors from the exchange RPC client.
#[derive(Debug, Error, Clone)]
pub enum DeribitError {
    /// Credential exchange failed or returned no token.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Transport-level failure, no response received.
    #[error("network error: {0}")]
    Network(String),

    /// Response did not decode to a valid envelope; carries the raw payload
    /// for diagnostics.
    #[error("protocol error: {reason}")]
    Protocol {
        /// Why the payload was rejected.
        reason: String,
        /// Raw response body as received.
        raw: String,
    },

    /// Well-formed error envelope from the exchange.
    #[error("exchange error {code}: {message}")]
    Api {
        /// Numeric error code from the exchange.
        code: i64,
        /// Error message from the exchange.
        message: String,
    },
}

impl DeribitError {
    /// Build a protocol error from a parse failure and the offending body.
    pub(crate) fn protocol(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}
