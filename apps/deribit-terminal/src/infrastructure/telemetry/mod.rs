//! Tracing Setup
//!
//! Structured logging via `tracing`, filtered through `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Defaults to `info` when `RUST_LOG` is unset. Call once, from the binary.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
