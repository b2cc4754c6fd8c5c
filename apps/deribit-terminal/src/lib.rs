#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Deribit Terminal - Trading Terminal Core
//!
//! Bridges an operator (or downstream automation) to the exchange:
//! authenticates, submits/edits/cancels orders, queries positions and
//! instruments, and streams live order-book snapshots to subscribed
//! WebSocket consumers.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: core types with no I/O dependencies
//!   - `market`: orders, positions, instruments, order-book snapshots
//!   - `subscription`: symbol → connection interest tracking
//!
//! - **Application**: use cases and port definitions
//!   - `ports`: order-book source consumed by the broadcaster
//!   - `services`: order execution over the exchange RPC client
//!
//! - **Infrastructure**: adapters and external integrations
//!   - `deribit`: JSON-RPC envelope, HTTP transport, session, client
//!   - `ws`: WebSocket streaming endpoint and control protocol
//!   - `broadcast`: periodic order-book fan-out
//!   - `config`: environment-driven settings
//!   - `telemetry`: tracing setup
//!
//! # Data Flow
//!
//! ```text
//!                control frames                   exchange (JSON-RPC)
//! Client 1 ──┐  subscribe/unsubscribe                    ▲
//! Client 2 ──┼──► WebSocket ──► Subscription             │
//! Client N ──┘    Endpoint      Registry                 │
//!    ▲                            │ snapshot             │
//!    │                            ▼                      │
//!    └──────────────── Broadcast Scheduler ──► Order Execution Service
//!        order-book pushes (every tick)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - core types with no I/O dependencies.
pub mod domain;

/// Application layer - use cases and port definitions.
pub mod application;

/// Infrastructure layer - adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::market::{
    BookLevel, Instrument, InstrumentKind, Order, OrderBookSnapshot, OrderKind, OrderSide,
    Position,
};
pub use domain::subscription::{
    ConnectionId, RegistryStats, SubscriptionRegistry, Symbol, UnsubscribeOutcome,
};

// Application surface
pub use application::ports::OrderBookSource;
pub use application::services::OrderExecutionService;

// Exchange client
pub use infrastructure::deribit::{DeribitError, ExchangeClient, RpcTransport, Session};

// Streaming endpoint and broadcaster
pub use infrastructure::broadcast::{BroadcastScheduler, BroadcastStatus};
pub use infrastructure::ws::{ServerError, StartStatus, StopStatus, StreamServer};

// Configuration
pub use infrastructure::config::{
    BroadcastSettings, ConfigError, Credentials, Environment, HttpSettings, ServerSettings,
    TerminalConfig,
};
