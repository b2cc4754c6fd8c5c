//! Exchange Session
//!
//! Holds the bearer token obtained from `public/auth` together with its
//! expiry, refreshing it only when absent or expired. Callers that need a
//! token for a private call go through [`Session::bearer`]; concurrent
//! callers serialize on the token slot so a refresh happens at most once.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::error::DeribitError;
use super::transport::RpcTransport;
use crate::infrastructure::config::Credentials;

/// Safety margin subtracted from the reported token lifetime, so a token is
/// refreshed before the exchange would start rejecting it.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct AuthParams<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResult {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    #[allow(dead_code)]
    refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct CachedToken {
    pub(crate) bearer: String,
    pub(crate) expires_at: Instant,
}

impl CachedToken {
    fn from_result(result: &AuthResult) -> Self {
        let lifetime = Duration::from_secs(result.expires_in);
        Self {
            bearer: result.access_token.clone(),
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        }
    }

    pub(crate) fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Authenticated session against the exchange.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    token: Mutex<Option<CachedToken>>,
}

impl Session {
    /// Create a session with no token yet acquired.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token: Mutex::new(None),
        }
    }

    /// Get a valid bearer token, authenticating if necessary.
    ///
    /// # Errors
    ///
    /// Any failure of the credential exchange — transport, protocol, or an
    /// error envelope — is reported as [`DeribitError::AuthenticationFailed`].
    pub async fn bearer(&self, transport: &RpcTransport) -> Result<String, DeribitError> {
        let mut slot = self.token.lock().await;

        if let Some(cached) = slot.as_ref() {
            if !cached.is_expired() {
                return Ok(cached.bearer.clone());
            }
        }

        let refreshed = self.authenticate(transport).await?;
        let bearer = refreshed.bearer.clone();
        *slot = Some(refreshed);
        Ok(bearer)
    }

    /// Drop the cached token, forcing re-authentication on the next call.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    async fn authenticate(&self, transport: &RpcTransport) -> Result<CachedToken, DeribitError> {
        let params = AuthParams {
            grant_type: "client_credentials",
            client_id: self.credentials.client_id(),
            client_secret: self.credentials.client_secret(),
        };
        let params = serde_json::to_value(&params)
            .map_err(|e| DeribitError::AuthenticationFailed(e.to_string()))?;

        let result = transport
            .call("public/auth", params, None)
            .await
            .map_err(|e| DeribitError::AuthenticationFailed(e.to_string()))?;

        let result: AuthResult = serde_json::from_value(result)
            .map_err(|e| DeribitError::AuthenticationFailed(format!("no token in result: {e}")))?;

        if result.access_token.is_empty() {
            return Err(DeribitError::AuthenticationFailed(
                "exchange returned an empty access token".to_string(),
            ));
        }

        tracing::debug!(expires_in = result.expires_in, "session token refreshed");

        Ok(CachedToken::from_result(&result))
    }
}
