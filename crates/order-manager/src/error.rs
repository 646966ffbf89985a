//! Order Manager errors

use hermes_core::{OrderStatus, ValidationError};
use hermes_ports::{AdapterError, StoreError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown order: {0}")]
    UnknownOrder(Uuid),

    #[error("Order {id} is terminal ({status}) and cannot change")]
    TerminalOrder { id: Uuid, status: OrderStatus },

    #[error("Order {id} is {status}, expected {expected}")]
    InvalidState {
        id: Uuid,
        status: OrderStatus,
        expected: OrderStatus,
    },

    #[error("Entity validation failed: {0}")]
    Entity(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

pub type Result<T> = std::result::Result<T, Error>;
