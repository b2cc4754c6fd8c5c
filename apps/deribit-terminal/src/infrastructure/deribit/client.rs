//! Exchange RPC Client
//!
//! Composes the HTTP transport and the session: private methods obtain a
//! bearer token first (re-using the cached one when still valid), public
//! methods go straight through. If the token fetch fails the payload call is
//! never issued.

use std::time::Duration;

use serde_json::Value;

use super::error::DeribitError;
use super::session::Session;
use super::transport::RpcTransport;
use crate::infrastructure::config::{Credentials, TerminalConfig};

/// Authenticated exchange RPC client.
#[derive(Debug)]
pub struct ExchangeClient {
    transport: RpcTransport,
    session: Session,
}

impl ExchangeClient {
    /// Build a client from the terminal configuration.
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be constructed.
    pub fn new(config: &TerminalConfig) -> Result<Self, DeribitError> {
        let transport = RpcTransport::new(config.rpc_url(), config.http.request_timeout)?;
        Ok(Self::from_parts(
            transport,
            Session::new(config.credentials.clone()),
        ))
    }

    /// Build a client against an explicit endpoint (used by tests to point
    /// at a stub exchange).
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be constructed.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        timeout: Duration,
        credentials: Credentials,
    ) -> Result<Self, DeribitError> {
        let transport = RpcTransport::new(endpoint, timeout)?;
        Ok(Self::from_parts(transport, Session::new(credentials)))
    }

    /// Assemble a client from pre-built parts.
    #[must_use]
    pub const fn from_parts(transport: RpcTransport, session: Session) -> Self {
        Self { transport, session }
    }

    /// Issue one RPC call.
    ///
    /// For authenticated calls a bearer token is obtained first; a failed
    /// token fetch aborts the call with an authentication error and no
    /// payload round trip.
    pub async fn call(
        &self,
        method: &str,
        params: Value,
        authenticated: bool,
    ) -> Result<Value, DeribitError> {
        let bearer = if authenticated {
            Some(self.session.bearer(&self.transport).await?)
        } else {
            None
        };

        self.transport.call(method, params, bearer.as_deref()).await
    }

    /// Access the session, e.g. to invalidate a token after a credential
    /// rotation.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}
