//! Signal - What the predictor outputs
//!
//! A signal is a directional trade recommendation with suggested price
//! levels and scoring. Signals are immutable once created: the predictor
//! produces them, the pipeline consumes each one exactly once.

use crate::error::{ValidationError, ValidationResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Direction of a signal.
///
/// `Neutral` is a valid prediction but maps to no order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalSide {
    Long,
    Short,
    CloseLong,
    CloseShort,
    Neutral,
}

impl SignalSide {
    /// True for sides that open or extend a position
    pub fn is_entry(&self) -> bool {
        matches!(self, SignalSide::Long | SignalSide::Short)
    }

    /// True for sides that reduce or close a position
    pub fn is_exit(&self) -> bool {
        matches!(self, SignalSide::CloseLong | SignalSide::CloseShort)
    }
}

/// A trade recommendation from an upstream strategy or predictor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Unique signal id
    pub id: Uuid,
    /// Symbol to trade
    pub symbol: String,
    /// Direction
    pub side: SignalSide,
    /// Suggested entry price
    pub suggested_price: Option<Decimal>,
    /// Suggested stop-loss level
    pub suggested_stop_loss: Option<Decimal>,
    /// Suggested take-profit level
    pub suggested_take_profit: Option<Decimal>,
    /// Signal strength (0.0 - 1.0), clamped by the builder
    pub strength: Decimal,
    /// Predictor confidence (0.0 - 1.0), clamped by the builder
    pub confidence: Decimal,
    /// Which strategy generated this signal
    pub strategy: String,
    /// When the signal was generated
    pub created_at: DateTime<Utc>,
    /// Non-critical provenance only - the pipeline never branches on this
    pub metadata: HashMap<String, String>,
}

impl Signal {
    /// Create a new signal with full strength and confidence
    pub fn new(strategy: impl Into<String>, symbol: impl Into<String>, side: SignalSide) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            suggested_price: None,
            suggested_stop_loss: None,
            suggested_take_profit: None,
            strength: Decimal::ONE,
            confidence: Decimal::ONE,
            strategy: strategy.into(),
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Builder: Set suggested entry price
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.suggested_price = Some(price);
        self
    }

    /// Builder: Set suggested stop-loss
    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.suggested_stop_loss = Some(price);
        self
    }

    /// Builder: Set suggested take-profit
    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.suggested_take_profit = Some(price);
        self
    }

    /// Builder: Set strength
    pub fn with_strength(mut self, strength: Decimal) -> Self {
        self.strength = strength.clamp(Decimal::ZERO, Decimal::ONE);
        self
    }

    /// Builder: Set confidence
    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = confidence.clamp(Decimal::ZERO, Decimal::ONE);
        self
    }

    /// Builder: Attach a provenance entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Validate the signal before it enters the pipeline.
    ///
    /// Malformed signals are dropped and logged, never retried.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingSymbol);
        }
        for (field, value) in [
            ("suggested_price", self.suggested_price),
            ("suggested_stop_loss", self.suggested_stop_loss),
            ("suggested_take_profit", self.suggested_take_profit),
        ] {
            if let Some(p) = value
                && p <= Decimal::ZERO
            {
                return Err(ValidationError::NonPositivePrice {
                    field,
                    value: p.to_string(),
                });
            }
        }
        for (field, value) in [("strength", self.strength), ("confidence", self.confidence)] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ValidationError::ScoreOutOfRange {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signal_builder() {
        let signal = Signal::new("momentum", "BTCUSDT", SignalSide::Long)
            .with_price(dec!(50000))
            .with_stop_loss(dec!(49000))
            .with_take_profit(dec!(52000))
            .with_strength(dec!(0.7))
            .with_confidence(dec!(0.9));

        assert_eq!(signal.symbol, "BTCUSDT");
        assert_eq!(signal.side, SignalSide::Long);
        assert_eq!(signal.suggested_price, Some(dec!(50000)));
        assert!(signal.validate().is_ok());
    }

    #[test]
    fn test_scores_clamped() {
        let signal = Signal::new("momentum", "BTCUSDT", SignalSide::Long)
            .with_strength(dec!(1.5))
            .with_confidence(dec!(-0.2));

        assert_eq!(signal.strength, Decimal::ONE);
        assert_eq!(signal.confidence, Decimal::ZERO);
    }

    #[test]
    fn test_rejects_empty_symbol() {
        let signal = Signal::new("momentum", "  ", SignalSide::Long);
        assert_eq!(signal.validate(), Err(ValidationError::MissingSymbol));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let signal = Signal::new("momentum", "BTCUSDT", SignalSide::Long).with_price(dec!(0));
        assert!(matches!(
            signal.validate(),
            Err(ValidationError::NonPositivePrice { .. })
        ));
    }

    #[test]
    fn test_side_wire_format() {
        // Persisted records depend on this spelling
        assert_eq!(
            serde_json::to_string(&SignalSide::CloseLong).unwrap(),
            "\"CLOSE_LONG\""
        );
        let side: SignalSide = serde_json::from_str("\"NEUTRAL\"").unwrap();
        assert_eq!(side, SignalSide::Neutral);
    }

    #[test]
    fn test_side_classification() {
        assert!(SignalSide::Long.is_entry());
        assert!(SignalSide::Short.is_entry());
        assert!(SignalSide::CloseLong.is_exit());
        assert!(SignalSide::CloseShort.is_exit());
        assert!(!SignalSide::Neutral.is_entry());
        assert!(!SignalSide::Neutral.is_exit());
    }
}
