//! Entity validation errors

use thiserror::Error;

/// A malformed or unroutable entity. Validation failures are dropped and
/// logged by the caller - never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing symbol")]
    MissingSymbol,

    #[error("Non-positive price: {field}={value}")]
    NonPositivePrice { field: &'static str, value: String },

    #[error("Score out of range for {field}: {value} (expected 0..=1)")]
    ScoreOutOfRange { field: &'static str, value: String },

    #[error("Negative size: {0}")]
    NegativeSize(String),

    #[error("Stop-loss {stop_loss} on wrong side of entry {entry} for {side} position")]
    StopLossOrientation {
        side: &'static str,
        stop_loss: String,
        entry: String,
    },

    #[error("Take-profit {take_profit} on wrong side of entry {entry} for {side} position")]
    TakeProfitOrientation {
        side: &'static str,
        take_profit: String,
        entry: String,
    },

    #[error("Invalid order transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
