//! Portfolio risk status
//!
//! Produced transiently by each risk-monitor tick. Not persisted as state -
//! only logged as an audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action the orchestrator must take in response to a risk breach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskAction {
    /// Stop accepting new signals, keep existing positions
    Pause,
    /// Emit closing orders for ~50% of every open position's size
    ReducePositions,
}

/// Outcome of a single portfolio risk check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskStatus {
    pub requires_action: bool,
    pub action: Option<RiskAction>,
    /// Human-readable audit reason
    pub reason: String,
    pub checked_at: DateTime<Utc>,
}

impl RiskStatus {
    /// No action required
    pub fn ok() -> Self {
        Self {
            requires_action: false,
            action: None,
            reason: "within limits".to_string(),
            checked_at: Utc::now(),
        }
    }

    /// An action is required
    pub fn action(action: RiskAction, reason: impl Into<String>) -> Self {
        Self {
            requires_action: true,
            action: Some(action),
            reason: reason.into(),
            checked_at: Utc::now(),
        }
    }
}
