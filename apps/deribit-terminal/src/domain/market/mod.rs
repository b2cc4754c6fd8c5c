//! Market Domain Types
//!
//! Value objects materialized from exchange responses: orders, positions,
//! instruments and order-book snapshots. These are transient — parsed from a
//! single RPC result and not retained by the core.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// Sides and Kinds
// =============================================================================

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy / long.
    Buy,
    /// Sell / short.
    Sell,
}

impl OrderSide {
    /// Wire name of the side.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    /// RPC method that places an order on this side.
    #[must_use]
    pub const fn rpc_method(&self) -> &'static str {
        match self {
            Self::Buy => "private/buy",
            Self::Sell => "private/sell",
        }
    }

    /// Parse a side from its wire name.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Resting order at a stated price.
    #[default]
    Limit,
    /// Order executed at the prevailing price; the price submitted with it
    /// is resolved by the caller beforehand.
    Market,
    /// Any other kind reported by the exchange (stop variants etc.).
    #[serde(other)]
    Other,
}

impl OrderKind {
    /// Wire name of the kind. Only `limit` and `market` are submittable.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// An order as reported by the exchange.
///
/// Only the exchange-assigned id is guaranteed; the remaining fields are
/// echoed back by the exchange and tolerated as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    /// Exchange-assigned order id.
    pub order_id: String,
    /// Instrument the order trades.
    #[serde(default)]
    pub instrument_name: Option<String>,
    /// Order side.
    #[serde(default)]
    pub direction: Option<OrderSide>,
    /// Order quantity.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Order price; absent for unresolved market orders.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Order kind.
    #[serde(default)]
    pub order_type: Option<OrderKind>,
    /// Exchange-side order state (open, filled, cancelled, ...).
    #[serde(default)]
    pub order_state: Option<String>,
}

// =============================================================================
// Positions
// =============================================================================

/// An open position as reported by the exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct Position {
    /// Instrument the position is held in.
    pub instrument_name: String,
    /// Signed position size.
    pub size: Decimal,
    /// Average entry price.
    pub average_price: Decimal,
    /// Unrealized P&L.
    pub floating_profit_loss: Decimal,
    /// Realized P&L.
    pub realized_profit_loss: Decimal,
    /// Position size relative to committed margin.
    pub leverage: Decimal,
}

// =============================================================================
// Instruments
// =============================================================================

/// Contract kind of an instrument, used only for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    /// Futures contract (including perpetuals).
    Future,
    /// Options contract.
    Option,
    /// Spot pair.
    Spot,
    /// Any other kind reported by the exchange.
    #[serde(other)]
    Other,
}

/// A tradable contract.
#[derive(Debug, Clone, Deserialize)]
pub struct Instrument {
    /// Instrument name, e.g. `BTC-PERPETUAL`.
    pub instrument_name: String,
    /// Contract kind.
    pub kind: InstrumentKind,
}

// =============================================================================
// Order Book
// =============================================================================

/// One price level of an order-book ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(Decimal, Decimal)")]
pub struct BookLevel {
    /// Level price.
    pub price: Decimal,
    /// Quantity resting at this price.
    pub amount: Decimal,
}

impl From<(Decimal, Decimal)> for BookLevel {
    fn from((price, amount): (Decimal, Decimal)) -> Self {
        Self { price, amount }
    }
}

#[derive(Debug, Deserialize)]
struct Ladders {
    #[serde(default)]
    bids: Vec<BookLevel>,
    #[serde(default)]
    asks: Vec<BookLevel>,
}

/// A point-in-time order book for one instrument.
///
/// Keeps the raw result object alongside the typed ladders: broadcast
/// consumers receive the raw payload verbatim, while the typed view serves
/// price resolution. Ladders arrive best-first from the exchange.
#[derive(Debug, Clone)]
pub struct OrderBookSnapshot {
    instrument: String,
    bids: Vec<BookLevel>,
    asks: Vec<BookLevel>,
    raw: Value,
}

impl OrderBookSnapshot {
    /// Parse a snapshot from an RPC result object, retaining the raw value.
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the ladders are not arrays of
    /// `[price, amount]` pairs.
    pub fn from_result(
        instrument: impl Into<String>,
        raw: Value,
    ) -> Result<Self, serde_json::Error> {
        let ladders: Ladders = serde_json::from_value(raw.clone())?;
        Ok(Self {
            instrument: instrument.into(),
            bids: ladders.bids,
            asks: ladders.asks,
            raw,
        })
    }

    /// Instrument this snapshot belongs to.
    #[must_use]
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Bid ladder, best first.
    #[must_use]
    pub fn bids(&self) -> &[BookLevel] {
        &self.bids
    }

    /// Ask ladder, best first.
    #[must_use]
    pub fn asks(&self) -> &[BookLevel] {
        &self.asks
    }

    /// Highest bid price, if any bids rest.
    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|level| level.price)
    }

    /// Lowest ask price, if any asks rest.
    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|level| level.price)
    }

    /// Price a market order on `side` would cross at: best ask for a buy,
    /// best bid for a sell. `None` when that side of the book is empty.
    #[must_use]
    pub fn market_price(&self, side: OrderSide) -> Option<Decimal> {
        match side {
            OrderSide::Buy => self.best_ask(),
            OrderSide::Sell => self.best_bid(),
        }
    }

    /// The raw result object as received, forwarded verbatim on broadcast.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }
}

// =============================================================================
// Tests
// =============================================================================
