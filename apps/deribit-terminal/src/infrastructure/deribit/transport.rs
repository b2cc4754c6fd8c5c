//! HTTP Transport for the Exchange RPC Endpoint
//!
//! Performs exactly one POST round trip per call: the request envelope goes
//! out as JSON, the body comes back and is parsed envelope-first. The HTTP
//! status code is deliberately ignored — the exchange reports failures
//! through well-formed error envelopes even on non-2xx responses, and a
//! non-envelope body is a protocol error regardless of status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use super::envelope::{RpcRequest, RpcResponse};
use super::error::DeribitError;

/// HTTP transport carrying RPC envelopes to a single exchange endpoint.
#[derive(Debug)]
pub struct RpcTransport {
    http: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl RpcTransport {
    /// Create a transport for the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns a network error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DeribitError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeribitError::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// The endpoint URL this transport posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue one RPC call and resolve the response envelope.
    ///
    /// Assigns the next monotonic request id, posts the envelope (with a
    /// bearer header when `bearer` is provided), and verifies the echoed id.
    pub async fn call(
        &self,
        method: &str,
        params: Value,
        bearer: Option<&str>,
    ) -> Result<Value, DeribitError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DeribitError::Network(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| DeribitError::Network(e.to_string()))?;

        tracing::trace!(method, id, "exchange call completed");

        RpcResponse::parse(&body)?.into_outcome(id, &body)
    }
}
