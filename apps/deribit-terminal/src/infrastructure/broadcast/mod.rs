//! Broadcast Scheduler
//!
//! Periodic fan-out of order-book snapshots to subscribed connections.
//!
//! Each tick takes a point-in-time copy of the subscription registry,
//! releases the registry immediately, and only then performs exchange calls
//! and pushes — subscriber churn is never serialized behind slow network
//! round trips. A fetch failure skips that symbol for the tick; a push
//! failure skips that connection. Neither stops the scheduler.
//!
//! Stopping is cooperative: clearing the enabled flag halts pushes after at
//! most one tick interval and never interrupts a tick in progress.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::ports::OrderBookSource;
use crate::infrastructure::ws::StreamServer;

/// Outcome of an enable/disable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastStatus {
    /// Broadcasting was switched on.
    Enabled,
    /// Broadcasting was already on; nothing changed.
    AlreadyEnabled,
    /// Broadcasting was switched off.
    Disabled,
    /// Broadcasting was already off; nothing changed.
    AlreadyDisabled,
}

/// Periodic order-book fan-out over a streaming server.
pub struct BroadcastScheduler {
    server: Arc<StreamServer>,
    source: Arc<dyn OrderBookSource>,
    tick_interval: Duration,
    enabled: AtomicBool,
}

impl BroadcastScheduler {
    /// Create a scheduler. Broadcasting starts disabled.
    #[must_use]
    pub fn new(
        server: Arc<StreamServer>,
        source: Arc<dyn OrderBookSource>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            server,
            source,
            tick_interval,
            enabled: AtomicBool::new(false),
        }
    }

    /// Switch broadcasting on.
    pub fn enable(&self) -> BroadcastStatus {
        if self.enabled.swap(true, Ordering::SeqCst) {
            BroadcastStatus::AlreadyEnabled
        } else {
            tracing::info!("broadcasting enabled");
            BroadcastStatus::Enabled
        }
    }

    /// Switch broadcasting off. Takes effect within one tick interval.
    pub fn disable(&self) -> BroadcastStatus {
        if self.enabled.swap(false, Ordering::SeqCst) {
            tracing::info!("broadcasting disabled");
            BroadcastStatus::Disabled
        } else {
            BroadcastStatus::AlreadyDisabled
        }
    }

    /// Whether broadcasting is currently enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Drive the tick loop until `shutdown` is cancelled.
    ///
    /// Ticks only fan out while the server is running and broadcasting is
    /// enabled; the loop itself keeps running so broadcasting can be toggled
    /// without respawning anything.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if self.server.is_running() && self.is_enabled() {
                        self.tick().await;
                    }
                }
            }
        }

        tracing::debug!("broadcast loop exited");
    }

    /// One fan-out pass: fetch a fresh order book per subscribed symbol and
    /// push the raw result to every subscriber of that symbol.
    pub async fn tick(&self) {
        let snapshot = self.server.registry().snapshot();

        for (symbol, subscribers) in snapshot {
            let book = match self.source.order_book(&symbol).await {
                Ok(book) => book,
                Err(error) => {
                    tracing::warn!(%symbol, %error, "order book fetch failed; symbol skipped this tick");
                    continue;
                }
            };

            let payload = book.raw().to_string();
            for id in subscribers {
                if self.server.send_text(id, &payload).is_err() {
                    tracing::warn!(conn = id, %symbol, "push skipped; connection not reachable");
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
