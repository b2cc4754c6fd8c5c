//! Deribit Terminal Binary
//!
//! Starts the terminal core: the exchange client, the WebSocket streaming
//! endpoint and the broadcast scheduler.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin deribit-terminal
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `DERIBIT_CLIENT_ID`: exchange API client id
//! - `DERIBIT_CLIENT_SECRET`: exchange API client secret
//!
//! ## Optional
//! - `DERIBIT_ENV`: TEST | LIVE (default: TEST)
//! - `TERMINAL_WS_PORT`: WebSocket listener port (default: 8081)
//! - `TERMINAL_TICK_INTERVAL_MS`: broadcast tick interval (default: 500)
//! - `TERMINAL_HTTP_TIMEOUT_SECS`: exchange request timeout (default: 10)
//! - `RUST_LOG`: log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use deribit_terminal::infrastructure::telemetry;
use deribit_terminal::{
    BroadcastScheduler, ExchangeClient, OrderExecutionService, StreamServer,
    SubscriptionRegistry, TerminalConfig,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();
    telemetry::init();

    tracing::info!("Starting Deribit terminal");

    let config = TerminalConfig::from_env().context("configuration")?;
    log_config(&config);

    let shutdown = CancellationToken::new();

    let client = Arc::new(ExchangeClient::new(&config).context("exchange client")?);
    let service = Arc::new(OrderExecutionService::new(client));

    let registry = Arc::new(SubscriptionRegistry::new());
    let server = Arc::new(StreamServer::new(Arc::clone(&registry)));

    let scheduler = Arc::new(BroadcastScheduler::new(
        Arc::clone(&server),
        Arc::clone(&service) as Arc<dyn deribit_terminal::OrderBookSource>,
        config.broadcast.tick_interval,
    ));

    server
        .start(config.server.ws_port)
        .await
        .context("streaming server")?;
    scheduler.enable();

    let broadcast_task = tokio::spawn(Arc::clone(&scheduler).run(shutdown.clone()));

    tracing::info!("Terminal ready");

    await_shutdown().await;

    shutdown.cancel();
    scheduler.disable();
    server.stop().await;
    let _ = broadcast_task.await;

    tracing::info!("Terminal stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &TerminalConfig) {
    tracing::info!(
        environment = config.environment.as_str(),
        ws_port = config.server.ws_port,
        tick_interval_ms = config.broadcast.tick_interval.as_millis(),
        rpc_url = config.rpc_url(),
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
