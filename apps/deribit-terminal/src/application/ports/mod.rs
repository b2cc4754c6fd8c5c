//! Port Definitions
//!
//! Interfaces between the application core and its adapters.

use async_trait::async_trait;

use crate::domain::market::OrderBookSnapshot;
use crate::infrastructure::deribit::DeribitError;

/// Source of order-book snapshots consumed by the broadcast scheduler.
///
/// Implemented by the order execution service against the live exchange and
/// by stubs in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderBookSource: Send + Sync {
    /// Fetch one fresh order-book snapshot for an instrument.
    async fn order_book(&self, instrument: &str) -> Result<OrderBookSnapshot, DeribitError>;
}
