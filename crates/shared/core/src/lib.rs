//! Hermes Core - Shared Entities
//!
//! The entity types flowing through the pipeline:
//!
//! - [`Signal`] - a directional trade recommendation from an upstream predictor
//! - [`Order`] - a logical order and its exchange lifecycle state machine
//! - [`TrackedPosition`] - an open position with derived health and PnL metrics
//! - [`RiskStatus`] - the transient output of a portfolio risk check
//! - [`AccountState`] - balance and exposure, the risk gate's input
//!
//! Entities are typed end to end. The `metadata` maps on signals and orders
//! carry non-critical provenance only (strategy names, audit reasons) - the
//! pipeline never branches on them.

pub mod account;
pub mod error;
pub mod order;
pub mod position;
pub mod risk_status;
pub mod signal;

// Re-export main types
pub use account::AccountState;
pub use error::{ValidationError, ValidationResult};
pub use order::{Order, OrderId, OrderStatus, OrderType, Side};
pub use position::{
    HealthThresholds, PositionHealth, PositionMetrics, PositionSide, PositionStatus,
    TrackedPosition,
};
pub use risk_status::{RiskAction, RiskStatus};
pub use signal::{Signal, SignalSide};
