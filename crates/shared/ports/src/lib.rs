//! Hermes Ports
//!
//! Port definitions (traits) for the trading pipeline. These define the
//! boundaries between the pipeline and its external collaborators: the
//! exchange execution adapter and the persistent store.
//!
//! Every call is fallible and treated as rate-limited RPC - the pipeline
//! never assumes a response arrives within any hard deadline.

mod adapter;
mod error;
mod memory;
mod store;

pub use adapter::{
    ExchangeOrder, ExchangePosition, ExecutionAdapter, PlaceOrderAck, PlaceOrderRequest, Ticker,
};
pub use error::{AdapterError, AdapterResult, StoreError, StoreResult};
pub use memory::{MemoryOrderStore, MemoryPositionStore};
pub use store::{OrderStore, PositionStore};
