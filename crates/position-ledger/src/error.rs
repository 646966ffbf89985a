//! Position Ledger errors

use hermes_core::ValidationError;
use hermes_ports::{AdapterError, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown position: {0}")]
    UnknownPosition(String),

    #[error("Entity validation failed: {0}")]
    Entity(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

pub type Result<T> = std::result::Result<T, Error>;
