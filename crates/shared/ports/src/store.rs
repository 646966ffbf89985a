//! Persistence ports
//!
//! Durable upsert keyed by logical id with at-least-once write semantics.
//! The pipeline is idempotent on re-write of the same id, so a retried
//! upsert is harmless.

use crate::error::StoreResult;
use async_trait::async_trait;
use hermes_core::{Order, TrackedPosition};
use uuid::Uuid;

/// Durable order records.
///
/// Orders are persisted in `Pending` before any network call
/// (durability-before-action) and on every status change after.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn upsert(&self, order: &Order) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Order>>;

    /// Liveness probe, checked before the orchestrator starts
    async fn health_check(&self) -> StoreResult<()>;
}

/// Durable position records.
#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn upsert(&self, position: &TrackedPosition) -> StoreResult<()>;

    async fn get(&self, id: &str) -> StoreResult<Option<TrackedPosition>>;

    /// Liveness probe, checked before the orchestrator starts
    async fn health_check(&self) -> StoreResult<()>;
}
