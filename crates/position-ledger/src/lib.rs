//! Hermes Position Ledger
//!
//! Owns the mapping from open positions to their last-known exchange state
//! and derived metrics. Division of authority:
//!
//! - the **exchange** is the source of truth for size and existence
//! - the **ledger** is the source of truth for derived metrics
//!   (PnL, ROI, health score)
//!
//! The sync loop periodically reconciles each tracked position against the
//! execution adapter; a position the exchange reports at size zero is
//! removed with reason `closed` and archived through the position store.

pub mod error;
pub mod ledger;

// Re-export main types
pub use error::{Error, Result};
pub use ledger::{LedgerStats, PositionLedger, SyncOutcome, TrackRequest};
