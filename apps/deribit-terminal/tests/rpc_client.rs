//! Exchange RPC Integration Tests
//!
//! Runs the client and the order execution service against a stub exchange
//! that speaks the JSON-RPC envelope protocol.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use deribit_terminal::{
    Credentials, DeribitError, ExchangeClient, InstrumentKind, OrderExecutionService, OrderKind,
    OrderSide,
};

// =============================================================================
// Stub Exchange Helpers
// =============================================================================

/// Responds with a success envelope, echoing the request id.
struct RpcResult(Value);

impl Respond for RpcResult {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let envelope: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let id = envelope.get("id").cloned().unwrap_or(json!(0));
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": self.0,
        }))
    }
}

/// Responds with an error envelope, echoing the request id.
struct RpcFailure {
    code: i64,
    message: &'static str,
}

impl Respond for RpcFailure {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let envelope: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let id = envelope.get("id").cloned().unwrap_or(json!(0));
        ResponseTemplate::new(400).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": self.code, "message": self.message},
        }))
    }
}

/// Responds with an envelope carrying neither result nor error.
struct RpcNeither;

impl Respond for RpcNeither {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let envelope: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let id = envelope.get("id").cloned().unwrap_or(json!(0));
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": id}))
    }
}

fn auth_result() -> Value {
    json!({
        "access_token": "tok-1",
        "expires_in": 900,
        "refresh_token": "refresh-1",
        "token_type": "bearer",
    })
}

async fn mount_auth(exchange: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "public/auth"})))
        .respond_with(RpcResult(auth_result()))
        .expect(expected_calls)
        .mount(exchange)
        .await;
}

fn service_for(exchange: &MockServer) -> OrderExecutionService {
    let client = ExchangeClient::with_endpoint(
        exchange.uri(),
        Duration::from_secs(5),
        Credentials::new("client-id".to_string(), "client-secret".to_string()),
    )
    .unwrap();
    OrderExecutionService::new(client.into())
}

// =============================================================================
// Order Placement
// =============================================================================

#[tokio::test]
async fn place_order_extracts_exchange_assigned_id() {
    let exchange = MockServer::start().await;
    mount_auth(&exchange, 1).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(json!({
            "method": "private/buy",
            "params": {
                "instrument_name": "BTC-PERPETUAL",
                "amount": 1.0,
                "price": 25000.0,
                "type": "limit",
            },
        })))
        .respond_with(RpcResult(json!({"order": {"order_id": "42"}, "trades": []})))
        .expect(1)
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    let order = service
        .place_order(
            "BTC-PERPETUAL",
            OrderSide::Buy,
            dec!(1),
            Some(dec!(25000)),
            OrderKind::Limit,
        )
        .await
        .unwrap();

    assert_eq!(order.order_id, "42");
}

#[tokio::test]
async fn sell_orders_use_the_sell_method() {
    let exchange = MockServer::start().await;
    mount_auth(&exchange, 1).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "private/sell"})))
        .respond_with(RpcResult(json!({"order": {"order_id": "s-7"}, "trades": []})))
        .expect(1)
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    let order = service
        .place_order(
            "ETH-PERPETUAL",
            OrderSide::Sell,
            dec!(2),
            Some(dec!(1850)),
            OrderKind::Limit,
        )
        .await
        .unwrap();

    assert_eq!(order.order_id, "s-7");
}

// =============================================================================
// Exchange Errors
// =============================================================================

#[tokio::test]
async fn cancel_surfaces_exchange_error_code() {
    let exchange = MockServer::start().await;
    mount_auth(&exchange, 1).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "private/cancel"})))
        .respond_with(RpcFailure {
            code: 10009,
            message: "not enough funds",
        })
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    let outcome = service.cancel_order("42").await;

    match outcome {
        Err(DeribitError::Api { code, message }) => {
            assert_eq!(code, 10009);
            assert_eq!(message, "not enough funds");
        }
        other => panic!("expected exchange error, got {other:?}"),
    }
}

#[tokio::test]
async fn auth_failure_aborts_before_the_payload_call() {
    let exchange = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "public/auth"})))
        .respond_with(RpcFailure {
            code: 13004,
            message: "invalid_credentials",
        })
        .mount(&exchange)
        .await;

    // The private method must never be reached.
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "private/cancel"})))
        .respond_with(RpcResult(json!({})))
        .expect(0)
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    let outcome = service.cancel_order("42").await;

    assert!(matches!(
        outcome,
        Err(DeribitError::AuthenticationFailed(_))
    ));
}

// =============================================================================
// Session Caching
// =============================================================================

#[tokio::test]
async fn session_reuses_token_across_calls() {
    let exchange = MockServer::start().await;
    // Two private calls, exactly one credential exchange.
    mount_auth(&exchange, 1).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "private/get_positions"})))
        .respond_with(RpcResult(json!([])))
        .expect(2)
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    service.get_positions("BTC").await.unwrap();
    service.get_positions("BTC").await.unwrap();
}

#[tokio::test]
async fn expired_token_triggers_one_refresh() {
    let exchange = MockServer::start().await;

    // A zero-lifetime token is expired as soon as it is issued.
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "public/auth"})))
        .respond_with(RpcResult(json!({
            "access_token": "tok-short",
            "expires_in": 0,
        })))
        .expect(2)
        .mount(&exchange)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "private/get_positions"})))
        .respond_with(RpcResult(json!([])))
        .expect(2)
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    service.get_positions("BTC").await.unwrap();
    service.get_positions("BTC").await.unwrap();
}

// =============================================================================
// Protocol Violations
// =============================================================================

#[tokio::test]
async fn empty_envelope_is_a_protocol_error() {
    let exchange = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(RpcNeither)
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    let outcome = service.get_order_book("BTC-PERPETUAL").await;
    assert!(matches!(outcome, Err(DeribitError::Protocol { .. })));
}

#[tokio::test]
async fn non_json_body_is_a_protocol_error_with_raw_payload() {
    let exchange = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    match service.get_order_book("BTC-PERPETUAL").await {
        Err(DeribitError::Protocol { raw, .. }) => assert!(raw.contains("bad gateway")),
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn mismatched_response_id_is_a_protocol_error() {
    let exchange = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 999_999,
            "result": {},
        })))
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    let outcome = service.get_order_book("BTC-PERPETUAL").await;
    assert!(matches!(outcome, Err(DeribitError::Protocol { .. })));
}

#[tokio::test]
async fn unreachable_exchange_is_a_network_error() {
    let client = ExchangeClient::with_endpoint(
        "http://127.0.0.1:1",
        Duration::from_millis(250),
        Credentials::new("id".to_string(), "secret".to_string()),
    )
    .unwrap();
    let service = OrderExecutionService::new(client.into());

    let outcome = service.get_order_book("BTC-PERPETUAL").await;
    assert!(matches!(outcome, Err(DeribitError::Network(_))));
}

// =============================================================================
// Public Queries
// =============================================================================

#[tokio::test]
async fn order_book_is_public_and_resolves_market_prices() {
    let exchange = MockServer::start().await;
    // No auth mock mounted: a token fetch would fail the test.

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({
            "method": "public/get_order_book",
            "params": {"instrument_name": "BTC-PERPETUAL"},
        })))
        .respond_with(RpcResult(json!({
            "instrument_name": "BTC-PERPETUAL",
            "bids": [[24999.5, 10.0], [24998.0, 3.0]],
            "asks": [[25000.5, 4.0], [25001.0, 8.0]],
        })))
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    let book = service.get_order_book("BTC-PERPETUAL").await.unwrap();
    assert_eq!(book.best_bid(), Some(dec!(24999.5)));
    assert_eq!(book.best_ask(), Some(dec!(25000.5)));

    let buy_price = service
        .resolve_market_price("BTC-PERPETUAL", OrderSide::Buy)
        .await
        .unwrap();
    assert_eq!(buy_price, Some(dec!(25000.5)));
}

#[tokio::test]
async fn positions_parse_into_typed_values() {
    let exchange = MockServer::start().await;
    mount_auth(&exchange, 1).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({
            "method": "private/get_positions",
            "params": {"currency": "BTC"},
        })))
        .respond_with(RpcResult(json!([{
            "instrument_name": "BTC-PERPETUAL",
            "size": -100.0,
            "average_price": 24000.0,
            "floating_profit_loss": -12.5,
            "realized_profit_loss": 3.25,
            "leverage": 10,
        }])))
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    let positions = service.get_positions("BTC").await.unwrap();

    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].instrument_name, "BTC-PERPETUAL");
    assert_eq!(positions[0].size, dec!(-100));
    assert_eq!(positions[0].leverage, dec!(10));
}

#[tokio::test]
async fn instruments_list_supports_kind_filtering() {
    let exchange = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "public/get_instruments"})))
        .respond_with(RpcResult(json!([
            {"instrument_name": "BTC-PERPETUAL", "kind": "future"},
            {"instrument_name": "BTC-27MAR26-30000-C", "kind": "option"},
        ])))
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);
    let instruments = service.list_instruments().await.unwrap();

    let futures: Vec<_> = instruments
        .iter()
        .filter(|i| i.kind == InstrumentKind::Future)
        .collect();
    assert_eq!(futures.len(), 1);
    assert_eq!(futures[0].instrument_name, "BTC-PERPETUAL");
}

#[tokio::test]
async fn modify_and_order_state_round_through_the_client() {
    let exchange = MockServer::start().await;
    mount_auth(&exchange, 1).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({
            "method": "private/edit",
            "params": {"order_id": "42", "amount": 2.0, "price": 24500.0},
        })))
        .respond_with(RpcResult(
            json!({"order": {"order_id": "42", "order_state": "open"}, "trades": []}),
        ))
        .mount(&exchange)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({
            "method": "private/get_order_state",
            "params": {"order_id": "42"},
        })))
        .respond_with(RpcResult(json!({"order_id": "42", "order_state": "open"})))
        .mount(&exchange)
        .await;

    let service = service_for(&exchange);

    let modified = service
        .modify_order("42", dec!(2), dec!(24500))
        .await
        .unwrap();
    assert_eq!(modified.order_id, "42");

    let state = service.get_order_state("42").await.unwrap();
    assert_eq!(state.order_state.as_deref(), Some("open"));
}
