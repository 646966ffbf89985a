//! Order entity and lifecycle state machine
//!
//! An order is owned exclusively by the Order Lifecycle Manager until it
//! reaches a terminal state. Transitions go through [`Order::transition`],
//! which rejects illegal moves instead of silently accepting them.

use crate::error::{ValidationError, ValidationResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a logical order
pub type OrderId = Uuid;

/// Order side on the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side that closes a position opened on this side
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Order lifecycle states.
///
/// ```text
/// Pending ──► Open ──► PartiallyFilled ──► Filled
///    │          │            │
///    │          ├────────────┴──► Cancelled | Expired
///    └──► Rejected
/// ```
///
/// `Pending` is the only initial state; `Filled`, `Cancelled`, `Rejected`
/// and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }

    /// Whether a transition to `next` is legal
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Open) | (Pending, Rejected) | (Pending, Cancelled) | (Pending, Expired) => {
                true
            }
            (Open, PartiallyFilled)
            | (Open, Filled)
            | (Open, Cancelled)
            | (Open, Rejected)
            | (Open, Expired) => true,
            (PartiallyFilled, Filled) | (PartiallyFilled, Cancelled) | (PartiallyFilled, Expired) => {
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A logical order correlated back to its originating signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Assigned by the exchange after submission
    pub exchange_id: Option<String>,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    /// Required for limit orders, None for market
    pub price: Option<Decimal>,
    pub status: OrderStatus,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// Originating signal, if any
    pub signal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Non-critical provenance only (strategy name, rejection reasons)
    pub metadata: HashMap<String, String>,
}

impl Order {
    /// Create a new order in `Pending`
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        order_type: OrderType,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            exchange_id: None,
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            filled_quantity: Decimal::ZERO,
            price,
            status: OrderStatus::Pending,
            stop_loss: None,
            take_profit: None,
            signal_id: None,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    /// Builder: Link back to the originating signal
    pub fn with_signal(mut self, signal_id: Uuid) -> Self {
        self.signal_id = Some(signal_id);
        self
    }

    /// Builder: Set protective levels
    pub fn with_protection(
        mut self,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
    ) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    /// Builder: Attach a provenance entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Apply a checked state transition
    pub fn transition(&mut self, next: OrderStatus) -> ValidationResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(ValidationError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Remaining quantity to be filled
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    /// True once the order admits no further transitions
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Validate type/price consistency
    pub fn validate(&self) -> bool {
        match self.order_type {
            OrderType::Market => true,
            OrderType::Limit => self.price.is_some(),
        }
    }
}
