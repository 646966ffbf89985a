//! Port-level errors

use thiserror::Error;

/// Errors from the execution adapter.
///
/// The pipeline captures these as terminal order state transitions or
/// retries read-only operations on the next scheduled tick - write actions
/// are never blindly retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Exchange API error: {0}")]
    Api(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Errors from the persistent store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Write failed for {key}: {reason}")]
    WriteFailed { key: String, reason: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
