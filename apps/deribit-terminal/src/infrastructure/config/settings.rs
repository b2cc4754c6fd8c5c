//! Terminal Configuration Settings
//!
//! Configuration types for the terminal core, loaded from environment
//! variables.

use std::time::Duration;

/// Exchange environment (test vs live).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Test exchange (simulated funds).
    #[default]
    Test,
    /// Live exchange (real money).
    Live,
}

impl Environment {
    /// Parse environment from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "LIVE" => Self::Live,
            _ => Self::Test,
        }
    }

    /// Check if this is the live environment.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Get the environment name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Live => "live",
        }
    }

    /// Base URL of the exchange JSON-RPC endpoint.
    #[must_use]
    pub const fn rpc_url(&self) -> &'static str {
        match self {
            Self::Test => "https://test.deribit.com/api/v2",
            Self::Live => "https://www.deribit.com/api/v2",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exchange API credentials.
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    /// Get the client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Streaming server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// WebSocket listener port.
    pub ws_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { ws_port: 8081 }
    }
}

/// Broadcast scheduler settings.
#[derive(Debug, Clone)]
pub struct BroadcastSettings {
    /// Interval between broadcast ticks.
    pub tick_interval: Duration,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
        }
    }
}

/// Exchange HTTP transport settings.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Request timeout for exchange calls.
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Complete terminal configuration.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Exchange environment.
    pub environment: Environment,
    /// API credentials.
    pub credentials: Credentials,
    /// Streaming server settings.
    pub server: ServerSettings,
    /// Broadcast scheduler settings.
    pub broadcast: BroadcastSettings,
    /// Exchange HTTP transport settings.
    pub http: HttpSettings,
}

impl TerminalConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = std::env::var("DERIBIT_CLIENT_ID")
            .map_err(|_| ConfigError::MissingEnvVar("DERIBIT_CLIENT_ID".to_string()))?;

        let client_secret = std::env::var("DERIBIT_CLIENT_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("DERIBIT_CLIENT_SECRET".to_string()))?;

        if client_id.is_empty() {
            return Err(ConfigError::EmptyValue("DERIBIT_CLIENT_ID".to_string()));
        }

        if client_secret.is_empty() {
            return Err(ConfigError::EmptyValue("DERIBIT_CLIENT_SECRET".to_string()));
        }

        let environment = std::env::var("DERIBIT_ENV")
            .map(|s| Environment::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let server = ServerSettings {
            ws_port: parse_env_u16("TERMINAL_WS_PORT", ServerSettings::default().ws_port),
        };

        let broadcast = BroadcastSettings {
            tick_interval: parse_env_duration_millis(
                "TERMINAL_TICK_INTERVAL_MS",
                BroadcastSettings::default().tick_interval,
            ),
        };

        let http = HttpSettings {
            request_timeout: parse_env_duration_secs(
                "TERMINAL_HTTP_TIMEOUT_SECS",
                HttpSettings::default().request_timeout,
            ),
        };

        Ok(Self {
            environment,
            credentials: Credentials::new(client_id, client_secret),
            server,
            broadcast,
            http,
        })
    }

    /// Get the exchange JSON-RPC endpoint URL for this environment.
    #[must_use]
    pub const fn rpc_url(&self) -> &'static str {
        self.environment.rpc_url()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!(
            Environment::from_str_case_insensitive("live"),
            Environment::Live
        );
        assert_eq!(
            Environment::from_str_case_insensitive("LIVE"),
            Environment::Live
        );
        assert_eq!(
            Environment::from_str_case_insensitive("test"),
            Environment::Test
        );
        assert_eq!(
            Environment::from_str_case_insensitive("unknown"),
            Environment::Test
        );
    }

    #[test]
    fn environment_urls() {
        assert!(Environment::Test.rpc_url().contains("test.deribit.com"));
        assert!(!Environment::Live.rpc_url().contains("test."));
        assert!(!Environment::Test.is_live());
        assert!(Environment::Live.is_live());
    }

    #[test]
    fn credentials_redacted_debug() {
        let creds = Credentials::new("id123".to_string(), "secret456".to_string());
        let debug = format!("{creds:?}");
        assert!(debug.contains("id123"));
        assert!(!debug.contains("secret456"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn server_settings_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.ws_port, 8081);
    }

    #[test]
    fn broadcast_settings_defaults() {
        let settings = BroadcastSettings::default();
        assert_eq!(settings.tick_interval, Duration::from_millis(500));
    }

    #[test]
    fn http_settings_defaults() {
        let settings = HttpSettings::default();
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
    }
}
