//! Pipeline lifecycle state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the whole pipeline.
///
/// `Paused` keeps every loop alive but rejects signal intake; internal
/// exit and risk flows still run. `Error` is terminal: a failed startup
/// health check is never silently retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Stopped,
    Starting,
    Running,
    Paused,
    Stopping,
    Error,
}

impl PipelineState {
    /// Whether `add_signal` should enqueue at all in this state
    pub fn accepts_signals(&self) -> bool {
        matches!(self, PipelineState::Running)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Stopped => "stopped",
            PipelineState::Starting => "starting",
            PipelineState::Running => "running",
            PipelineState::Paused => "paused",
            PipelineState::Stopping => "stopping",
            PipelineState::Error => "error",
        };
        write!(f, "{s}")
    }
}
