//! Tracked positions and derived metrics
//!
//! A [`TrackedPosition`] is the ledger's view of an open position. The
//! exchange is the source of truth for size and existence; the ledger owns
//! the derived metrics (PnL, ROI, health). Health is a pure function of ROI
//! with no hysteresis - a position may flap between states as price moves.

use crate::error::{ValidationError, ValidationResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Side of a tracked position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

/// Lifecycle status of a tracked position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Active,
    Closed,
    PartialClosed,
    Liquidated,
    Error,
}

impl PositionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PositionStatus::Closed | PositionStatus::Liquidated | PositionStatus::Error
        )
    }
}

/// Health classification derived from ROI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionHealth {
    Healthy,
    Warning,
    Critical,
    Unknown,
}

/// ROI thresholds for the health state machine.
///
/// Defaults: ROI <= -5% => Critical (score 0.1), ROI <= -3% => Warning
/// (score 0.5), otherwise Healthy (score 1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthThresholds {
    pub critical_roi_pct: Decimal,
    pub warning_roi_pct: Decimal,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            critical_roi_pct: dec!(-5),
            warning_roi_pct: dec!(-3),
        }
    }
}

impl HealthThresholds {
    /// Classify an ROI percentage. Deterministic, no hysteresis.
    pub fn classify(&self, roi_pct: Decimal) -> (PositionHealth, Decimal) {
        if roi_pct <= self.critical_roi_pct {
            (PositionHealth::Critical, dec!(0.1))
        } else if roi_pct <= self.warning_roi_pct {
            (PositionHealth::Warning, dec!(0.5))
        } else {
            (PositionHealth::Healthy, dec!(1.0))
        }
    }
}

/// Derived metrics, recomputed on every mark-to-market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionMetrics {
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    /// PnL as a percentage of entry notional
    pub roi_pct: Decimal,
    pub hold_time_secs: i64,
    /// Highest unrealized PnL seen
    pub max_profit: Decimal,
    /// Lowest unrealized PnL seen
    pub max_drawdown: Decimal,
    /// Bounded [0,1] summary of position risk
    pub health_score: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl Default for PositionMetrics {
    fn default() -> Self {
        Self {
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            roi_pct: Decimal::ZERO,
            hold_time_secs: 0,
            max_profit: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            health_score: dec!(1.0),
            last_updated: Utc::now(),
        }
    }
}

/// An open position tracked by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub id: String,
    pub symbol: String,
    pub side: PositionSide,
    /// Always >= 0; direction lives in `side`
    pub size: Decimal,
    pub entry_price: Decimal,
    /// Refreshed by the sync loop
    pub current_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub status: PositionStatus,
    pub health: PositionHealth,
    pub metrics: PositionMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackedPosition {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        side: PositionSide,
        size: Decimal,
        entry_price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            symbol: symbol.into(),
            side,
            size,
            entry_price,
            current_price: entry_price,
            stop_loss: None,
            take_profit: None,
            status: PositionStatus::Active,
            health: PositionHealth::Unknown,
            metrics: PositionMetrics::default(),
            created_at: now,
            updated_at: now,
        }
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

    /// Validate the position's invariants.
    ///
    /// A violated protective-level orientation is a data-integrity defect:
    /// it must be rejected before the record is ever persisted.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.size < Decimal::ZERO {
            return Err(ValidationError::NegativeSize(self.size.to_string()));
        }
        match self.side {
            PositionSide::Long => {
                // Long: stop below entry, target above
                if let Some(sl) = self.stop_loss
                    && sl >= self.entry_price
                {
                    return Err(ValidationError::StopLossOrientation {
                        side: "long",
                        stop_loss: sl.to_string(),
                        entry: self.entry_price.to_string(),
                    });
                }
                if let Some(tp) = self.take_profit
                    && tp <= self.entry_price
                {
                    return Err(ValidationError::TakeProfitOrientation {
                        side: "long",
                        take_profit: tp.to_string(),
                        entry: self.entry_price.to_string(),
                    });
                }
            }
            PositionSide::Short => {
                // Short: stop above entry, target below
                if let Some(sl) = self.stop_loss
                    && sl <= self.entry_price
                {
                    return Err(ValidationError::StopLossOrientation {
                        side: "short",
                        stop_loss: sl.to_string(),
                        entry: self.entry_price.to_string(),
                    });
                }
                if let Some(tp) = self.take_profit
                    && tp >= self.entry_price
                {
                    return Err(ValidationError::TakeProfitOrientation {
                        side: "short",
                        take_profit: tp.to_string(),
                        entry: self.entry_price.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Unrealized PnL at a given mark price.
    ///
    /// Long: `(mark - entry) * size`. Short: `(entry - mark) * size`.
    pub fn unrealized_pnl(&self, mark_price: Decimal) -> Decimal {
        match self.side {
            PositionSide::Long => (mark_price - self.entry_price) * self.size,
            PositionSide::Short => (self.entry_price - mark_price) * self.size,
        }
    }

    /// Entry notional (entry price x size)
    pub fn entry_notional(&self) -> Decimal {
        self.entry_price * self.size
    }

    /// Current notional exposure
    pub fn notional(&self) -> Decimal {
        self.current_price * self.size
    }

    /// Recompute all derived metrics against a fresh mark price.
    ///
    /// Pure with respect to inputs: the same price and clock always yield
    /// the same metrics and health.
    pub fn mark_to_market(
        &mut self,
        mark_price: Decimal,
        thresholds: &HealthThresholds,
        now: DateTime<Utc>,
    ) -> &PositionMetrics {
        self.current_price = mark_price;

        let pnl = self.unrealized_pnl(mark_price);
        let notional = self.entry_notional();
        let roi_pct = if notional > Decimal::ZERO {
            pnl / notional * dec!(100)
        } else {
            Decimal::ZERO
        };

        let (health, score) = thresholds.classify(roi_pct);

        self.metrics.unrealized_pnl = pnl;
        self.metrics.roi_pct = roi_pct;
        self.metrics.hold_time_secs = now.signed_duration_since(self.created_at).num_seconds();
        self.metrics.max_profit = self.metrics.max_profit.max(pnl);
        self.metrics.max_drawdown = self.metrics.max_drawdown.min(pnl);
        self.metrics.health_score = score;
        self.metrics.last_updated = now;
        self.health = health;
        self.updated_at = now;

        &self.metrics
    }
}
