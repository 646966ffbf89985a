//! Hermes Risk Gate
//!
//! Two independent risk surfaces, both read-only evaluators:
//!
//! - [`RiskGate`] - per-signal: approves, rejects or down-sizes a proposed
//!   position given a signal and fresh account state. Fails closed when
//!   account state is unavailable.
//! - [`PortfolioRiskMonitor`] - timer-driven: evaluates the whole portfolio
//!   and tells the orchestrator to pause intake or reduce positions.
//!
//! Neither performs side effects; all persistence happens downstream.

pub mod config;
pub mod gate;
pub mod monitor;

// Re-export main types
pub use config::RiskConfig;
pub use gate::{RiskDecision, RiskGate};
pub use monitor::PortfolioRiskMonitor;
