//! Portfolio-wide risk monitoring
//!
//! Runs on a timer, not per-signal. Each check produces a transient
//! [`RiskStatus`] that is logged as an audit record; the orchestrator
//! executes the action it carries.

use crate::config::RiskConfig;
use hermes_core::{AccountState, RiskAction, RiskStatus, TrackedPosition};
use log::warn;
use rust_decimal::Decimal;

/// Stateless portfolio evaluator.
pub struct PortfolioRiskMonitor {
    config: RiskConfig,
}

impl PortfolioRiskMonitor {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Evaluate the portfolio against configured ceilings.
    ///
    /// Exposure breaches take priority over loss breaches: shedding
    /// exposure also shrinks further loss potential.
    pub fn check(&self, positions: &[TrackedPosition], account: &AccountState) -> RiskStatus {
        if account.balance <= Decimal::ZERO {
            return RiskStatus::action(RiskAction::Pause, "no available balance");
        }

        let total_notional: Decimal = positions.iter().map(|p| p.notional()).sum();
        let total_unrealized: Decimal =
            positions.iter().map(|p| p.metrics.unrealized_pnl).sum();

        let exposure_ceiling = self.config.max_total_exposure_pct * account.balance;
        if total_notional > exposure_ceiling {
            let status = RiskStatus::action(
                RiskAction::ReducePositions,
                format!(
                    "risk_reduction: exposure {} exceeds ceiling {}",
                    total_notional, exposure_ceiling
                ),
            );
            warn!("[RISK] {}", status.reason);
            return status;
        }

        let loss_limit = self.config.pause_loss_pct * account.balance;
        if total_unrealized < -loss_limit {
            let status = RiskStatus::action(
                RiskAction::Pause,
                format!(
                    "unrealized loss {} exceeds limit {}",
                    total_unrealized, loss_limit
                ),
            );
            warn!("[RISK] {}", status.reason);
            return status;
        }

        RiskStatus::ok()
    }
}
