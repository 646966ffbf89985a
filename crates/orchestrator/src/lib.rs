//! Hermes Trading Orchestrator
//!
//! Owns the end-to-end pipeline:
//!
//! ```text
//!   signals ──> risk gate ──> order manager ──> execution adapter
//!                                  │
//!                                  └──> position ledger <── sync loop
//! ```
//!
//! All collaborators are injected at construction. The orchestrator spawns
//! one task per concern (signals, orders, sync, risk, metrics), each bounded
//! by a queue or a timer and stopped through a shared shutdown channel.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod state;

// Re-export main types
pub use config::OrchestratorConfig;
pub use error::{Error, Result};
pub use orchestrator::{OrchestratorStatus, OrderIntent, OrderWork, TradingOrchestrator};
pub use state::PipelineState;
