//! Hermes Order Lifecycle Manager
//!
//! Owns the mapping from logical orders to exchange order identifiers.
//! Responsibilities:
//!
//! - **Creation**: maps signal sides to order sides and persists every
//!   order in `Pending` before any network call (durability-before-action)
//! - **Submission**: per-order locking, a rolling per-symbol duplicate
//!   window that suppresses double submissions locally, and capture of
//!   adapter failures as terminal `Rejected` transitions - never as
//!   unhandled errors
//! - **Cancellation**: non-terminal orders only, on adapter confirmation
//! - **Reconciliation**: periodically diffs locally tracked open orders
//!   against the exchange's live order list so nothing goes stale
//!
//! ```text
//! Signal ──► create_from_signal ──► Pending (persisted)
//!                                      │ submit
//!                      duplicate? ──► Rejected (local, no adapter call)
//!                                      │
//!                              adapter.place_order
//!                             ok │           │ err
//!                              Open       Rejected (adapter message)
//!                                │
//!                  reconcile ──► PartiallyFilled / Filled / Cancelled
//! ```

pub mod error;
pub mod manager;

// Re-export main types
pub use error::{Error, Result};
pub use manager::{OrderManager, OrderManagerConfig, OrderStats, ReconcileReport, SubmitOutcome};
