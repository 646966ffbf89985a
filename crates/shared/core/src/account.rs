//! Account state - the risk gate's input

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A snapshot of account balance and aggregate exposure.
///
/// Fetched fresh for each risk evaluation. When unavailable the gate
/// fails closed and rejects the signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    /// Available balance in quote currency
    pub balance: Decimal,
    /// Aggregate notional of all open positions
    pub open_exposure: Decimal,
    /// Number of currently open positions
    pub open_position_count: usize,
}

impl AccountState {
    pub fn new(balance: Decimal) -> Self {
        Self {
            balance,
            open_exposure: Decimal::ZERO,
            open_position_count: 0,
        }
    }

    pub fn with_exposure(mut self, open_exposure: Decimal, open_position_count: usize) -> Self {
        self.open_exposure = open_exposure;
        self.open_position_count = open_position_count;
        self
    }
}
