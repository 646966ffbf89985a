//! In-memory store implementations
//!
//! Dashmap-backed stores for tests and local runs. Writes are keyed by
//! logical id, so repeated upserts of the same record are no-ops beyond
//! the last write - matching the at-least-once contract.

use crate::error::StoreResult;
use crate::store::{OrderStore, PositionStore};
use async_trait::async_trait;
use dashmap::DashMap;
use hermes_core::{Order, TrackedPosition};
use uuid::Uuid;

/// In-memory order store
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: DashMap<Uuid, Order>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted order records
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn upsert(&self, order: &Order) -> StoreResult<()> {
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(&id).map(|entry| entry.clone()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// In-memory position store
#[derive(Debug, Default)]
pub struct MemoryPositionStore {
    positions: DashMap<String, TrackedPosition>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted position records
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[async_trait]
impl PositionStore for MemoryPositionStore {
    async fn upsert(&self, position: &TrackedPosition) -> StoreResult<()> {
        self.positions
            .insert(position.id.clone(), position.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<TrackedPosition>> {
        Ok(self.positions.get(id).map(|entry| entry.clone()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{OrderStatus, OrderType, PositionSide, Side};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_order_upsert_is_idempotent_by_id() {
        let store = MemoryOrderStore::new();
        let mut order = Order::new("BTCUSDT", Side::Buy, OrderType::Market, dec!(1), None);

        store.upsert(&order).await.unwrap();
        order.transition(OrderStatus::Rejected).unwrap();
        store.upsert(&order).await.unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Rejected);
    }

    #[tokio::test]
    async fn test_position_roundtrip() {
        let store = MemoryPositionStore::new();
        let position =
            TrackedPosition::new("pos-1", "BTCUSDT", PositionSide::Long, dec!(1), dec!(50000));

        store.upsert(&position).await.unwrap();
        let stored = store.get("pos-1").await.unwrap().unwrap();
        assert_eq!(stored.symbol, "BTCUSDT");
        assert!(store.get("missing").await.unwrap().is_none());
    }
}
