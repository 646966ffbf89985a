//! Orchestrator configuration

use hermes_core::HealthThresholds;
use hermes_order_manager::OrderManagerConfig;
use hermes_risk_gate::RiskConfig;
use serde::{Deserialize, Serialize};

/// Tunables for the pipeline and its background loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Bounded signal intake; a full queue rejects, never blocks
    pub signal_queue_capacity: usize,
    /// Bounded approved-order queue between the gate and submission
    pub order_queue_capacity: usize,
    /// How often each position is reconciled against the exchange
    pub sync_interval_ms: u64,
    /// How often the portfolio risk monitor runs
    pub risk_check_interval_ms: u64,
    /// How often aggregate stats are logged
    pub metrics_interval_ms: u64,
    /// How long `stop` waits for each worker to drain
    pub shutdown_timeout_ms: u64,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub orders: OrderManagerConfig,
    #[serde(default)]
    pub thresholds: HealthThresholds,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            signal_queue_capacity: 1_000,
            order_queue_capacity: 1_000,
            sync_interval_ms: 10_000,
            risk_check_interval_ms: 30_000,
            metrics_interval_ms: 60_000,
            shutdown_timeout_ms: 5_000,
            risk: RiskConfig::default(),
            orders: OrderManagerConfig::default(),
            thresholds: HealthThresholds::default(),
        }
    }
}
