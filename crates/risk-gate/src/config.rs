//! Risk configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Limits shared by the per-signal gate and the portfolio monitor.
///
/// All `*_pct` fields are fractions of account balance (0.02 = 2%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Fraction of balance risked to the stop per trade (sizing formula)
    pub risk_pct: Decimal,
    /// Hard cap on a single position's notional as a fraction of balance.
    /// The gate never approves a notional above `max_risk_per_trade * balance`.
    pub max_risk_per_trade: Decimal,
    /// Ceiling on aggregate open notional as a fraction of balance
    pub max_total_exposure_pct: Decimal,
    /// Maximum number of concurrently open positions
    pub max_open_positions: usize,
    /// Signals below this confidence are rejected
    pub min_confidence: Decimal,
    /// Aggregate unrealized loss (fraction of balance) that pauses intake
    pub pause_loss_pct: Decimal,
    /// Fraction of each position closed on a reduce-positions action
    pub reduce_fraction: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_pct: dec!(0.01),
            max_risk_per_trade: dec!(0.10),
            max_total_exposure_pct: dec!(0.50),
            max_open_positions: 10,
            min_confidence: Decimal::ZERO,
            pause_loss_pct: dec!(0.05),
            reduce_fraction: dec!(0.5),
        }
    }
}
