//! Configuration loading and settings types.

mod settings;

pub use settings::{
    BroadcastSettings, ConfigError, Credentials, Environment, HttpSettings, ServerSettings,
    TerminalConfig,
};
