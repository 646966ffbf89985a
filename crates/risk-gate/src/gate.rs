//! Per-signal risk evaluation
//!
//! Sizing formula: `risk_capital = balance * risk_pct`; with a stop-loss,
//! `quantity = risk_capital / |entry - stop|`, otherwise
//! `quantity = risk_capital / entry`. The result is scaled by signal
//! strength and hard-capped so the notional never exceeds
//! `max_risk_per_trade * balance`.

use crate::config::RiskConfig;
use hermes_core::{AccountState, Signal};
use log::{debug, warn};
use rust_decimal::Decimal;

/// Outcome of a per-signal evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskDecision {
    /// Approved at the computed quantity
    Approve { quantity: Decimal },
    /// Approved after shrinking to fit a limit
    Resize { quantity: Decimal, reason: String },
    /// Rejected; the signal is dropped and logged, never retried
    Reject { reason: String },
}

impl RiskDecision {
    fn reject(reason: impl Into<String>) -> Self {
        RiskDecision::Reject {
            reason: reason.into(),
        }
    }

    /// Approved quantity, if any
    pub fn quantity(&self) -> Option<Decimal> {
        match self {
            RiskDecision::Approve { quantity } | RiskDecision::Resize { quantity, .. } => {
                Some(*quantity)
            }
            RiskDecision::Reject { .. } => None,
        }
    }
}

/// Stateless per-signal evaluator. Read-only: no persistence, no network.
pub struct RiskGate {
    config: RiskConfig,
}

impl RiskGate {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Evaluate with possibly-missing account state.
    ///
    /// Fail-closed: an unavailable account state rejects rather than
    /// silently approving.
    pub fn evaluate_opt(&self, signal: &Signal, account: Option<&AccountState>) -> RiskDecision {
        match account {
            Some(account) => self.evaluate(signal, account),
            None => {
                warn!("[RISK] {}: account state unavailable, failing closed", signal.symbol);
                RiskDecision::reject("account state unavailable")
            }
        }
    }

    /// Evaluate an entry signal against account state.
    pub fn evaluate(&self, signal: &Signal, account: &AccountState) -> RiskDecision {
        if !signal.side.is_entry() {
            return RiskDecision::reject(format!(
                "side {:?} carries no entry to size",
                signal.side
            ));
        }

        if signal.confidence < self.config.min_confidence {
            return RiskDecision::reject(format!(
                "confidence {} below minimum {}",
                signal.confidence, self.config.min_confidence
            ));
        }

        if account.balance <= Decimal::ZERO {
            return RiskDecision::reject("no available balance");
        }

        if account.open_position_count >= self.config.max_open_positions {
            return RiskDecision::reject(format!(
                "open position count {} at limit {}",
                account.open_position_count, self.config.max_open_positions
            ));
        }

        let Some(entry) = signal.suggested_price else {
            return RiskDecision::reject("no suggested price to size against");
        };

        // Risk-based sizing to the stop distance
        let risk_capital = account.balance * self.config.risk_pct;
        let mut quantity = match signal.suggested_stop_loss {
            Some(stop) if stop != entry => risk_capital / (entry - stop).abs(),
            _ => risk_capital / entry,
        };
        quantity *= signal.strength;

        if quantity <= Decimal::ZERO {
            return RiskDecision::reject("computed quantity is zero");
        }

        // Hard notional cap per trade
        let max_notional = self.config.max_risk_per_trade * account.balance;
        let mut resized = None;
        if quantity * entry > max_notional {
            quantity = max_notional / entry;
            resized = Some(format!("notional capped at {}", max_notional));
        }

        // Aggregate exposure ceiling is a rejection, not a resize
        let notional = quantity * entry;
        let exposure_ceiling = self.config.max_total_exposure_pct * account.balance;
        if account.open_exposure + notional > exposure_ceiling {
            return RiskDecision::reject(format!(
                "aggregate exposure {} + {} exceeds ceiling {}",
                account.open_exposure, notional, exposure_ceiling
            ));
        }

        debug!(
            "[RISK] {} {:?} sized to {} (notional {})",
            signal.symbol, signal.side, quantity, notional
        );

        match resized {
            Some(reason) => RiskDecision::Resize { quantity, reason },
            None => RiskDecision::Approve { quantity },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::SignalSide;
    use rust_decimal_macros::dec;

    fn entry_signal() -> Signal {
        Signal::new("momentum", "BTCUSDT", SignalSide::Long)
            .with_price(dec!(50000))
            .with_stop_loss(dec!(49000))
    }

    fn account(balance: Decimal) -> AccountState {
        AccountState::new(balance)
    }

    #[test]
    fn test_sizes_to_stop_distance() {
        let gate = RiskGate::new(RiskConfig::default());
        let signal = Signal::new("momentum", "BTCUSDT", SignalSide::Long)
            .with_price(dec!(50000))
            .with_stop_loss(dec!(40000));
        let decision = gate.evaluate(&signal, &account(dec!(100000)));

        // risk capital 1000, stop distance 10000 -> 0.1; notional 5000
        // stays inside the 10% per-trade cap
        assert_eq!(decision, RiskDecision::Approve { quantity: dec!(0.1) });
    }

    #[test]
    fn test_default_cap_binds_on_tight_stop() {
        let gate = RiskGate::new(RiskConfig::default());
        let decision = gate.evaluate(&entry_signal(), &account(dec!(100000)));

        // Stop distance 1000 sizes to 1.0 (notional 50000), shrunk to the
        // 10000 per-trade ceiling
        assert!(matches!(decision, RiskDecision::Resize { .. }));
        assert_eq!(decision.quantity(), Some(dec!(0.2)));
    }

    #[test]
    fn test_notional_never_exceeds_max_risk_per_trade() {
        let config = RiskConfig {
            risk_pct: dec!(0.05),
            max_risk_per_trade: dec!(0.10),
            ..RiskConfig::default()
        };
        let gate = RiskGate::new(config);

        // Tight stop produces a huge raw quantity; the cap must bind
        let signal = Signal::new("momentum", "BTCUSDT", SignalSide::Long)
            .with_price(dec!(50000))
            .with_stop_loss(dec!(49990));
        let balance = dec!(100000);
        let decision = gate.evaluate(&signal, &account(balance));

        let quantity = decision.quantity().unwrap();
        assert!(matches!(decision, RiskDecision::Resize { .. }));
        assert!(quantity * dec!(50000) <= dec!(0.10) * balance);
    }

    #[test]
    fn test_rejects_on_aggregate_exposure() {
        let gate = RiskGate::new(RiskConfig::default());
        let account = account(dec!(100000)).with_exposure(dec!(49900), 3);

        let decision = gate.evaluate(&entry_signal(), &account);
        assert!(matches!(decision, RiskDecision::Reject { .. }));
    }

    #[test]
    fn test_rejects_at_position_count_limit() {
        let config = RiskConfig {
            max_open_positions: 2,
            ..RiskConfig::default()
        };
        let gate = RiskGate::new(config);
        let account = account(dec!(100000)).with_exposure(dec!(1000), 2);

        let decision = gate.evaluate(&entry_signal(), &account);
        assert!(matches!(decision, RiskDecision::Reject { .. }));
    }

    #[test]
    fn test_fails_closed_without_account_state() {
        let gate = RiskGate::new(RiskConfig::default());
        let decision = gate.evaluate_opt(&entry_signal(), None);
        assert_eq!(
            decision,
            RiskDecision::Reject {
                reason: "account state unavailable".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_low_confidence() {
        let config = RiskConfig {
            min_confidence: dec!(0.5),
            ..RiskConfig::default()
        };
        let gate = RiskGate::new(config);
        let signal = entry_signal().with_confidence(dec!(0.3));

        let decision = gate.evaluate(&signal, &account(dec!(100000)));
        assert!(matches!(decision, RiskDecision::Reject { .. }));
    }

    #[test]
    fn test_rejects_neutral_and_exit_sides() {
        let gate = RiskGate::new(RiskConfig::default());
        let account = account(dec!(100000));

        for side in [SignalSide::Neutral, SignalSide::CloseLong, SignalSide::CloseShort] {
            let signal = Signal::new("momentum", "BTCUSDT", side).with_price(dec!(50000));
            assert!(matches!(
                gate.evaluate(&signal, &account),
                RiskDecision::Reject { .. }
            ));
        }
    }

    #[test]
    fn test_strength_scales_quantity() {
        let gate = RiskGate::new(RiskConfig::default());
        let signal = Signal::new("momentum", "BTCUSDT", SignalSide::Long)
            .with_price(dec!(50000))
            .with_stop_loss(dec!(40000))
            .with_strength(dec!(0.5));
        let decision = gate.evaluate(&signal, &account(dec!(100000)));

        // Half strength halves the full-strength 0.1 sizing
        assert_eq!(decision.quantity(), Some(dec!(0.05)));
    }
}
