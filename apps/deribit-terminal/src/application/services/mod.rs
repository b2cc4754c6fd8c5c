//! Order Execution Service
//!
//! Stateless mapping of domain operations onto the exchange RPC client.
//! Every operation is a single authenticated or public call; errors from the
//! client are propagated unchanged — no retries, no partial handling.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::application::ports::OrderBookSource;
use crate::domain::market::{Instrument, Order, OrderBookSnapshot, OrderKind, OrderSide, Position};
use crate::infrastructure::deribit::{DeribitError, ExchangeClient};

// =============================================================================
// Request Parameters
// =============================================================================

#[derive(Debug, Serialize)]
struct PlaceOrderParams<'a> {
    instrument_name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    price: Option<Decimal>,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct OrderIdParams<'a> {
    order_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ModifyOrderParams<'a> {
    order_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
}

#[derive(Debug, Serialize)]
struct PositionsParams<'a> {
    currency: &'a str,
}

#[derive(Debug, Serialize)]
struct OrderBookParams<'a> {
    instrument_name: &'a str,
}

fn to_params<T: Serialize>(params: &T) -> Result<Value, DeribitError> {
    serde_json::to_value(params)
        .map_err(|e| DeribitError::protocol(format!("params serialization: {e}"), String::new()))
}

// =============================================================================
// Service
// =============================================================================

/// Thin, stateless facade over the exchange RPC client.
#[derive(Debug, Clone)]
pub struct OrderExecutionService {
    client: Arc<ExchangeClient>,
}

impl OrderExecutionService {
    /// Create a service over an exchange client.
    #[must_use]
    pub const fn new(client: Arc<ExchangeClient>) -> Self {
        Self { client }
    }

    /// Place an order. Buy orders go to `private/buy`, sell orders to
    /// `private/sell`.
    ///
    /// For market orders the caller resolves the price beforehand (see
    /// [`Self::resolve_market_price`]); the resolved price is submitted
    /// as-is with no staleness re-check.
    pub async fn place_order(
        &self,
        instrument: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Option<Decimal>,
        kind: OrderKind,
    ) -> Result<Order, DeribitError> {
        let params = to_params(&PlaceOrderParams {
            instrument_name: instrument,
            amount: quantity,
            price,
            kind: kind.as_str(),
        })?;

        let result = self.client.call(side.rpc_method(), params, true).await?;
        let order = wrapped_order(result)?;
        tracing::info!(order_id = %order.order_id, instrument, %side, "order placed");
        Ok(order)
    }

    /// Cancel an order by exchange id.
    pub async fn cancel_order(&self, order_id: &str) -> Result<Order, DeribitError> {
        let params = to_params(&OrderIdParams { order_id })?;
        let result = self.client.call("private/cancel", params, true).await?;
        let order = bare_order(result)?;
        tracing::info!(order_id = %order.order_id, "order cancelled");
        Ok(order)
    }

    /// Change the quantity and price of a resting order.
    pub async fn modify_order(
        &self,
        order_id: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Order, DeribitError> {
        let params = to_params(&ModifyOrderParams {
            order_id,
            amount: quantity,
            price,
        })?;
        let result = self.client.call("private/edit", params, true).await?;
        let order = wrapped_order(result)?;
        tracing::info!(order_id = %order.order_id, "order modified");
        Ok(order)
    }

    /// Query the current state of an order.
    pub async fn get_order_state(&self, order_id: &str) -> Result<Order, DeribitError> {
        let params = to_params(&OrderIdParams { order_id })?;
        let result = self
            .client
            .call("private/get_order_state", params, true)
            .await?;
        bare_order(result)
    }

    /// List open positions for a currency.
    pub async fn get_positions(&self, currency: &str) -> Result<Vec<Position>, DeribitError> {
        let params = to_params(&PositionsParams { currency })?;
        let result = self
            .client
            .call("private/get_positions", params, true)
            .await?;
        parse_result(result)
    }

    /// Fetch one order-book snapshot for an instrument (public call).
    pub async fn get_order_book(
        &self,
        instrument: &str,
    ) -> Result<OrderBookSnapshot, DeribitError> {
        let params = to_params(&OrderBookParams {
            instrument_name: instrument,
        })?;
        let result = self
            .client
            .call("public/get_order_book", params, false)
            .await?;
        OrderBookSnapshot::from_result(instrument, result.clone())
            .map_err(|e| DeribitError::protocol(format!("order book: {e}"), result.to_string()))
    }

    /// List all tradable instruments (public call). Kind-based filtering
    /// stays with the caller.
    pub async fn list_instruments(&self) -> Result<Vec<Instrument>, DeribitError> {
        let result = self
            .client
            .call("public/get_instruments", Value::Object(serde_json::Map::new()), false)
            .await?;
        parse_result(result)
    }

    /// Resolve the price a market order would be submitted at: best ask for
    /// a buy, best bid for a sell, from a fresh snapshot. `None` when that
    /// side of the book is empty.
    ///
    /// The snapshot is not re-checked for staleness between resolution and
    /// submission.
    pub async fn resolve_market_price(
        &self,
        instrument: &str,
        side: OrderSide,
    ) -> Result<Option<Decimal>, DeribitError> {
        let book = self.get_order_book(instrument).await?;
        Ok(book.market_price(side))
    }
}

#[async_trait]
impl OrderBookSource for OrderExecutionService {
    async fn order_book(&self, instrument: &str) -> Result<OrderBookSnapshot, DeribitError> {
        self.get_order_book(instrument).await
    }
}

// =============================================================================
// Result Extraction
// =============================================================================

/// Extract the order object from a result of shape `{"order": {...}, ...}`.
fn wrapped_order(result: Value) -> Result<Order, DeribitError> {
    let raw = result.to_string();
    let order = result
        .get("order")
        .cloned()
        .ok_or_else(|| DeribitError::protocol("result carries no order object", raw.clone()))?;
    serde_json::from_value(order).map_err(|e| DeribitError::protocol(format!("order: {e}"), raw))
}

/// Parse a result that is the order object itself.
fn bare_order(result: Value) -> Result<Order, DeribitError> {
    let raw = result.to_string();
    serde_json::from_value(result)
        .map_err(|e| DeribitError::protocol(format!("order: {e}"), raw))
}

fn parse_result<T: serde::de::DeserializeOwned>(result: Value) -> Result<T, DeribitError> {
    let raw = result.to_string();
    serde_json::from_value(result)
        .map_err(|e| DeribitError::protocol(format!("result: {e}"), raw))
}

// =============================================================================
// Tests
// =============================================================================
