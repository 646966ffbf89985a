//! Execution adapter port
//!
//! Implemented by the wire-level exchange client (out of core scope). The
//! pipeline treats it as an unreliable, rate-limited RPC peer: every call
//! is fallible, and write actions are never blindly retried.

use crate::error::AdapterResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hermes_core::{OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request to place an order on the exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    /// Logical order id, forwarded as the client order id
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// None for market orders
    pub price: Option<Decimal>,
}

/// Acknowledgement of a placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderAck {
    /// Exchange-assigned order id
    pub exchange_id: String,
    pub accepted_at: DateTime<Utc>,
}

/// The exchange's view of a live order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeOrder {
    pub exchange_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub price: Option<Decimal>,
}

/// The exchange's authoritative view of a position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangePosition {
    pub symbol: String,
    /// Zero means the position no longer exists on the exchange
    pub size: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Decimal,
}

/// Last-traded price for a symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Places and cancels orders and reports exchange state.
#[async_trait]
pub trait ExecutionAdapter: Send + Sync {
    /// Place an order. An `Err` means the exchange did not accept it.
    async fn place_order(&self, request: &PlaceOrderRequest) -> AdapterResult<PlaceOrderAck>;

    /// Cancel an order. `Ok(false)` means the exchange declined the cancel
    /// (e.g. the order already filled).
    async fn cancel_order(&self, exchange_id: &str, symbol: &str) -> AdapterResult<bool>;

    /// All orders currently live on the exchange for this account
    async fn fetch_open_orders(&self) -> AdapterResult<Vec<ExchangeOrder>>;

    /// Authoritative positions for the given symbols
    async fn fetch_positions(&self, symbols: &[String]) -> AdapterResult<Vec<ExchangePosition>>;

    /// Last-traded price
    async fn fetch_ticker(&self, symbol: &str) -> AdapterResult<Ticker>;

    /// Available account balance in quote currency
    async fn fetch_balance(&self) -> AdapterResult<Decimal>;

    /// Liveness probe, checked before the orchestrator starts
    async fn health_check(&self) -> AdapterResult<()>;

    /// Adapter name for logging
    fn name(&self) -> &str;
}
