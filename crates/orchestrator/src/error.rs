//! Orchestrator errors

use crate::state::PipelineState;
use hermes_ports::{AdapterError, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Pipeline is {0}, not accepting signals")]
    NotAccepting(PipelineState),

    #[error("Signal queue is full, signal dropped")]
    Backpressure,

    #[error("Pipeline is {actual}, expected {expected}")]
    InvalidState {
        actual: PipelineState,
        expected: PipelineState,
    },

    #[error("Startup health check failed: {0}")]
    StartupHealth(String),

    #[error("Order manager error: {0}")]
    Orders(#[from] hermes_order_manager::Error),

    #[error("Position ledger error: {0}")]
    Ledger(#[from] hermes_position_ledger::Error),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
