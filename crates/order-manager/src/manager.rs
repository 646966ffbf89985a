//! Order lifecycle management
//!
//! The live order map is sharded (`DashMap`) with one `tokio::Mutex` per
//! order, so mutation of a specific order is serialized while unrelated
//! orders never contend. Locks are held across the adapter call on purpose:
//! nothing else may touch an order while its submission is in flight.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use hermes_core::{Order, OrderId, OrderStatus, OrderType, Side, Signal, SignalSide};
use hermes_ports::{ExecutionAdapter, OrderStore, PlaceOrderRequest};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Order manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderManagerConfig {
    /// Rolling per-symbol window within which a second submission is
    /// suppressed locally, without contacting the adapter
    pub duplicate_window_ms: i64,
}

impl Default for OrderManagerConfig {
    fn default() -> Self {
        Self {
            duplicate_window_ms: 5_000,
        }
    }
}

/// Outcome of a submission attempt.
///
/// Adapter failures surface here as [`SubmitOutcome::Rejected`], not as
/// `Err` - every failure is a recorded terminal transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted by the exchange
    Submitted { exchange_id: String },
    /// Suppressed by the per-symbol duplicate window; adapter not contacted
    DuplicateSuppressed,
    /// The adapter declined; the order is terminal with the message attached
    Rejected { reason: String },
}

/// Counters for the operational status surface
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderStats {
    pub submitted: u64,
    pub duplicates_suppressed: u64,
    pub rejected: u64,
    pub cancelled: u64,
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileReport {
    /// Live orders checked against the exchange
    pub checked: usize,
    /// Fill quantities refreshed from the exchange view
    pub updated: usize,
    /// Orders missing from the exchange, finalized as filled
    pub finalized_filled: usize,
    /// Orders missing from the exchange, finalized as cancelled
    pub finalized_cancelled: usize,
}

/// Owns every order from creation to terminal state.
pub struct OrderManager {
    config: OrderManagerConfig,
    adapter: Arc<dyn ExecutionAdapter>,
    store: Arc<dyn OrderStore>,
    /// Live orders, one lock per id
    live: DashMap<OrderId, Arc<Mutex<Order>>>,
    /// Last submission time per symbol (the duplicate window)
    recent_submissions: DashMap<String, DateTime<Utc>>,
    submitted: AtomicU64,
    duplicates_suppressed: AtomicU64,
    rejected: AtomicU64,
    cancelled: AtomicU64,
}

impl OrderManager {
    pub fn new(
        config: OrderManagerConfig,
        adapter: Arc<dyn ExecutionAdapter>,
        store: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            config,
            adapter,
            store,
            live: DashMap::new(),
            recent_submissions: DashMap::new(),
            submitted: AtomicU64::new(0),
            duplicates_suppressed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
        }
    }

    /// Map a signal side to an order side, if one is defined
    pub fn order_side(side: SignalSide) -> Option<Side> {
        match side {
            SignalSide::Long | SignalSide::CloseShort => Some(Side::Buy),
            SignalSide::Short | SignalSide::CloseLong => Some(Side::Sell),
            SignalSide::Neutral => None,
        }
    }

    /// Create an order from a signal at the given quantity.
    ///
    /// Returns `Ok(None)` when the side maps to no order (`Neutral`).
    /// The order is persisted in `Pending` before any network call.
    pub async fn create_from_signal(
        &self,
        signal: &Signal,
        quantity: Decimal,
    ) -> Result<Option<Order>> {
        let Some(side) = Self::order_side(signal.side) else {
            debug!("[ORDERS] {}: side {:?} maps to no order", signal.symbol, signal.side);
            return Ok(None);
        };

        let (order_type, price) = match signal.suggested_price {
            Some(price) => (OrderType::Limit, Some(price)),
            None => (OrderType::Market, None),
        };

        let mut order = Order::new(signal.symbol.clone(), side, order_type, quantity, price)
            .with_signal(signal.id)
            .with_metadata("strategy", signal.strategy.clone());
        if signal.side.is_entry() {
            order = order.with_protection(signal.suggested_stop_loss, signal.suggested_take_profit);
        }

        // Durability before action: the Pending record hits the store
        // before the order is ever submitted anywhere.
        self.store.upsert(&order).await?;
        self.live.insert(order.id, Arc::new(Mutex::new(order.clone())));

        debug!(
            "[ORDERS] created {} {:?} {} x {} from signal {}",
            order.id, side, order.symbol, quantity, signal.id
        );
        Ok(Some(order))
    }

    /// Submit an order to the exchange.
    ///
    /// Holds the per-order lock for the duration, including the adapter
    /// call. A submission for the same symbol inside the duplicate window
    /// is rejected locally - the adapter is not contacted.
    pub async fn submit(&self, order_id: OrderId) -> Result<SubmitOutcome> {
        let entry = self
            .live
            .get(&order_id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(Error::UnknownOrder(order_id))?;
        let mut order = entry.lock().await;

        if order.status != OrderStatus::Pending {
            return Err(Error::InvalidState {
                id: order_id,
                status: order.status,
                expected: OrderStatus::Pending,
            });
        }

        let now = Utc::now();
        let window = Duration::milliseconds(self.config.duplicate_window_ms);

        if let Some(last) = self.recent_submissions.get(&order.symbol)
            && now.signed_duration_since(*last) < window
        {
            drop(last);
            warn!(
                "[ORDERS] {} {}: duplicate submission within {}ms window, suppressed",
                order.id, order.symbol, self.config.duplicate_window_ms
            );
            order.transition(OrderStatus::Rejected)?;
            order
                .metadata
                .insert("reject_reason".to_string(), "duplicate_suppressed".to_string());
            self.store.upsert(&order).await?;
            self.duplicates_suppressed.fetch_add(1, Ordering::Relaxed);
            return Ok(SubmitOutcome::DuplicateSuppressed);
        }

        // Mark the window before the call so a concurrent second submit
        // for the symbol is suppressed even while this one is in flight.
        self.recent_submissions.insert(order.symbol.clone(), now);

        let request = PlaceOrderRequest {
            client_order_id: order.id.to_string(),
            symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.order_type,
            quantity: order.quantity,
            price: order.price,
        };

        match self.adapter.place_order(&request).await {
            Ok(ack) => {
                order.exchange_id = Some(ack.exchange_id.clone());
                order.transition(OrderStatus::Open)?;
                self.store.upsert(&order).await?;
                self.submitted.fetch_add(1, Ordering::Relaxed);
                info!(
                    "[ORDERS] {} open on {} as {}",
                    order.id,
                    self.adapter.name(),
                    ack.exchange_id
                );
                Ok(SubmitOutcome::Submitted {
                    exchange_id: ack.exchange_id,
                })
            }
            Err(err) => {
                // No blind retry of a financial write: capture the failure
                // as a terminal transition and move on.
                let reason = err.to_string();
                order.transition(OrderStatus::Rejected)?;
                order
                    .metadata
                    .insert("adapter_error".to_string(), reason.clone());
                self.store.upsert(&order).await?;
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("[ORDERS] {} rejected by adapter: {}", order.id, reason);
                Ok(SubmitOutcome::Rejected { reason })
            }
        }
    }

    /// Cancel a non-terminal order.
    ///
    /// `Ok(false)` means the exchange declined the cancel (e.g. already
    /// filled); reconciliation will pick up the final state.
    pub async fn cancel(&self, order_id: OrderId) -> Result<bool> {
        let entry = self
            .live
            .get(&order_id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(Error::UnknownOrder(order_id))?;
        let mut order = entry.lock().await;

        if order.is_terminal() {
            return Err(Error::TerminalOrder {
                id: order_id,
                status: order.status,
            });
        }

        match &order.exchange_id {
            // Never submitted: cancel is purely local
            None => {
                order.transition(OrderStatus::Cancelled)?;
                self.store.upsert(&order).await?;
                self.cancelled.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            Some(exchange_id) => {
                let confirmed = self
                    .adapter
                    .cancel_order(exchange_id, &order.symbol)
                    .await?;
                if confirmed {
                    order.transition(OrderStatus::Cancelled)?;
                    self.store.upsert(&order).await?;
                    self.cancelled.fetch_add(1, Ordering::Relaxed);
                    info!("[ORDERS] {} cancelled", order.id);
                } else {
                    debug!("[ORDERS] {}: exchange declined cancel", order.id);
                }
                Ok(confirmed)
            }
        }
    }

    /// Diff locally tracked open orders against the exchange's live list.
    ///
    /// An order missing from the exchange is finalized from its last known
    /// fill data - filled if it saw any fills, cancelled otherwise - never
    /// left stale. Terminal orders are evicted from the live map.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let exchange_orders = self.adapter.fetch_open_orders().await?;

        // Snapshot the live entries first; dashmap guards must not be held
        // across the per-order awaits below.
        let entries: Vec<Arc<Mutex<Order>>> =
            self.live.iter().map(|e| Arc::clone(e.value())).collect();

        let mut report = ReconcileReport::default();
        let mut evict = Vec::new();

        for entry in entries {
            let mut order = entry.lock().await;

            if order.is_terminal() {
                evict.push(order.id);
                continue;
            }
            let Some(exchange_id) = order.exchange_id.clone() else {
                // Pending, not yet submitted; nothing to diff
                continue;
            };
            report.checked += 1;

            match exchange_orders.iter().find(|o| o.exchange_id == exchange_id) {
                Some(live) => {
                    if live.filled_quantity != order.filled_quantity {
                        order.filled_quantity = live.filled_quantity;
                        if order.status == OrderStatus::Open
                            && live.filled_quantity > Decimal::ZERO
                            && live.filled_quantity < order.quantity
                        {
                            order.transition(OrderStatus::PartiallyFilled)?;
                        }
                        self.store.upsert(&order).await?;
                        report.updated += 1;
                    }
                }
                None => {
                    // Gone from the exchange: filled-or-cancelled
                    if order.filled_quantity > Decimal::ZERO {
                        if order.status == OrderStatus::Open {
                            order.transition(OrderStatus::PartiallyFilled)?;
                        }
                        order.transition(OrderStatus::Filled)?;
                        report.finalized_filled += 1;
                        info!("[ORDERS] {} finalized as filled off-exchange", order.id);
                    } else {
                        order.transition(OrderStatus::Cancelled)?;
                        report.finalized_cancelled += 1;
                        info!("[ORDERS] {} finalized as cancelled off-exchange", order.id);
                    }
                    self.store.upsert(&order).await?;
                    evict.push(order.id);
                }
            }
        }

        for id in evict {
            self.live.remove(&id);
        }
        Ok(report)
    }

    /// Snapshot a single order
    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        let entry = self.live.get(&order_id).map(|e| Arc::clone(e.value()))?;
        let order = entry.lock().await;
        Some(order.clone())
    }

    /// Snapshot all live non-terminal orders
    pub async fn open_orders(&self) -> Vec<Order> {
        let entries: Vec<Arc<Mutex<Order>>> =
            self.live.iter().map(|e| Arc::clone(e.value())).collect();
        let mut orders = Vec::with_capacity(entries.len());
        for entry in entries {
            let order = entry.lock().await;
            if !order.is_terminal() {
                orders.push(order.clone());
            }
        }
        orders
    }

    /// Number of orders in the live map (including not-yet-evicted terminals)
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Counter snapshot for the status surface
    pub fn stats(&self) -> OrderStats {
        OrderStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            duplicates_suppressed: self.duplicates_suppressed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hermes_ports::{
        AdapterError, AdapterResult, ExchangeOrder, ExchangePosition, MemoryOrderStore,
        PlaceOrderAck, Ticker,
    };
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;

    /// Mock adapter that counts placements and can be told to fail
    #[derive(Default)]
    struct MockAdapter {
        place_calls: AtomicUsize,
        fail_placement: bool,
        open_orders: std::sync::Mutex<Vec<ExchangeOrder>>,
    }

    #[async_trait]
    impl ExecutionAdapter for MockAdapter {
        async fn place_order(&self, request: &PlaceOrderRequest) -> AdapterResult<PlaceOrderAck> {
            self.place_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_placement {
                return Err(AdapterError::Api("insufficient margin".to_string()));
            }
            Ok(PlaceOrderAck {
                exchange_id: format!("EX-{}", request.client_order_id),
                accepted_at: Utc::now(),
            })
        }

        async fn cancel_order(&self, _exchange_id: &str, _symbol: &str) -> AdapterResult<bool> {
            Ok(true)
        }

        async fn fetch_open_orders(&self) -> AdapterResult<Vec<ExchangeOrder>> {
            Ok(self.open_orders.lock().unwrap().clone())
        }

        async fn fetch_positions(
            &self,
            _symbols: &[String],
        ) -> AdapterResult<Vec<ExchangePosition>> {
            Ok(Vec::new())
        }

        async fn fetch_ticker(&self, symbol: &str) -> AdapterResult<Ticker> {
            Ok(Ticker {
                symbol: symbol.to_string(),
                last: dec!(50000),
                timestamp: Utc::now(),
            })
        }

        async fn fetch_balance(&self) -> AdapterResult<Decimal> {
            Ok(dec!(100000))
        }

        async fn health_check(&self) -> AdapterResult<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "mock-exchange"
        }
    }

    fn manager_with(adapter: Arc<MockAdapter>) -> (OrderManager, Arc<MemoryOrderStore>) {
        let store = Arc::new(MemoryOrderStore::new());
        let manager = OrderManager::new(
            OrderManagerConfig::default(),
            adapter,
            Arc::clone(&store) as Arc<dyn OrderStore>,
        );
        (manager, store)
    }

    fn long_signal(symbol: &str) -> Signal {
        Signal::new("momentum", symbol, SignalSide::Long)
            .with_price(dec!(50000))
            .with_stop_loss(dec!(49000))
            .with_take_profit(dec!(52000))
    }

    #[test]
    fn test_side_mapping() {
        assert_eq!(OrderManager::order_side(SignalSide::Long), Some(Side::Buy));
        assert_eq!(OrderManager::order_side(SignalSide::CloseShort), Some(Side::Buy));
        assert_eq!(OrderManager::order_side(SignalSide::Short), Some(Side::Sell));
        assert_eq!(OrderManager::order_side(SignalSide::CloseLong), Some(Side::Sell));
        assert_eq!(OrderManager::order_side(SignalSide::Neutral), None);
    }

    #[tokio::test]
    async fn test_neutral_creates_no_order() {
        let (manager, store) = manager_with(Arc::new(MockAdapter::default()));
        let signal = Signal::new("momentum", "BTCUSDT", SignalSide::Neutral);

        let order = manager.create_from_signal(&signal, dec!(1)).await.unwrap();
        assert!(order.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_pending_persisted_before_submission() {
        let (manager, store) = manager_with(Arc::new(MockAdapter::default()));
        let order = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();

        // Persisted durable record exists while the order has never been
        // anywhere near the adapter.
        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.exchange_id.is_none());
        assert_eq!(stored.stop_loss, Some(dec!(49000)));
    }

    #[tokio::test]
    async fn test_submit_success_opens_with_exchange_id() {
        let adapter = Arc::new(MockAdapter::default());
        let (manager, store) = manager_with(Arc::clone(&adapter));
        let order = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();

        let outcome = manager.submit(order.id).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted { .. }));

        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Open);
        assert!(stored.exchange_id.is_some());
        assert_eq!(manager.stats().submitted, 1);
    }

    #[tokio::test]
    async fn test_adapter_failure_is_terminal_not_error() {
        let adapter = Arc::new(MockAdapter {
            fail_placement: true,
            ..Default::default()
        });
        let (manager, store) = manager_with(Arc::clone(&adapter));
        let order = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();

        // Not an Err: the failure becomes a terminal transition
        let outcome = manager.submit(order.id).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));

        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Rejected);
        assert!(stored.metadata.get("adapter_error").unwrap().contains("margin"));
    }

    #[tokio::test]
    async fn test_duplicate_window_yields_one_adapter_call() {
        let adapter = Arc::new(MockAdapter::default());
        let (manager, _) = manager_with(Arc::clone(&adapter));

        let first = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();
        let second = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(
            manager.submit(first.id).await.unwrap(),
            SubmitOutcome::Submitted { .. }
        ));
        assert_eq!(
            manager.submit(second.id).await.unwrap(),
            SubmitOutcome::DuplicateSuppressed
        );

        // Exactly one call reached the exchange
        assert_eq!(adapter.place_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.stats().duplicates_suppressed, 1);
    }

    #[tokio::test]
    async fn test_different_symbols_do_not_suppress() {
        let adapter = Arc::new(MockAdapter::default());
        let (manager, _) = manager_with(Arc::clone(&adapter));

        let btc = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();
        let eth = manager
            .create_from_signal(&long_signal("ETHUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();

        manager.submit(btc.id).await.unwrap();
        manager.submit(eth.id).await.unwrap();
        assert_eq!(adapter.place_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_pending_is_local() {
        let adapter = Arc::new(MockAdapter::default());
        let (manager, store) = manager_with(Arc::clone(&adapter));
        let order = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();

        assert!(manager.cancel(order.id).await.unwrap());
        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
        // Never touched the adapter
        assert_eq!(adapter.place_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_terminal_order_errors() {
        let adapter = Arc::new(MockAdapter {
            fail_placement: true,
            ..Default::default()
        });
        let (manager, _) = manager_with(Arc::clone(&adapter));
        let order = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();
        manager.submit(order.id).await.unwrap(); // now Rejected

        assert!(matches!(
            manager.cancel(order.id).await,
            Err(Error::TerminalOrder { .. })
        ));
    }

    #[tokio::test]
    async fn test_reconcile_updates_partial_fills() {
        let adapter = Arc::new(MockAdapter::default());
        let (manager, _) = manager_with(Arc::clone(&adapter));
        let order = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(2))
            .await
            .unwrap()
            .unwrap();
        manager.submit(order.id).await.unwrap();

        let exchange_id = manager.order(order.id).await.unwrap().exchange_id.unwrap();
        adapter.open_orders.lock().unwrap().push(ExchangeOrder {
            exchange_id,
            symbol: "BTCUSDT".to_string(),
            side: Side::Buy,
            quantity: dec!(2),
            filled_quantity: dec!(0.5),
            price: Some(dec!(50000)),
        });

        let report = manager.reconcile().await.unwrap();
        assert_eq!(report.updated, 1);

        let updated = manager.order(order.id).await.unwrap();
        assert_eq!(updated.status, OrderStatus::PartiallyFilled);
        assert_eq!(updated.filled_quantity, dec!(0.5));
    }

    #[tokio::test]
    async fn test_reconcile_finalizes_missing_orders() {
        let adapter = Arc::new(MockAdapter::default());
        let (manager, store) = manager_with(Arc::clone(&adapter));

        // Submitted but absent from the exchange's open list with no fills
        let gone = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(1))
            .await
            .unwrap()
            .unwrap();
        manager.submit(gone.id).await.unwrap();

        let report = manager.reconcile().await.unwrap();
        assert_eq!(report.finalized_cancelled, 1);
        assert_eq!(report.finalized_filled, 0);

        let stored = store.get(gone.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
        // Evicted from the live map
        assert!(manager.order(gone.id).await.is_none());
    }

    #[tokio::test]
    async fn test_reconcile_finalizes_partial_as_filled() {
        let adapter = Arc::new(MockAdapter::default());
        let (manager, store) = manager_with(Arc::clone(&adapter));
        let order = manager
            .create_from_signal(&long_signal("BTCUSDT"), dec!(2))
            .await
            .unwrap()
            .unwrap();
        manager.submit(order.id).await.unwrap();

        // First pass sees a partial fill, second pass sees it gone
        let exchange_id = manager.order(order.id).await.unwrap().exchange_id.unwrap();
        adapter.open_orders.lock().unwrap().push(ExchangeOrder {
            exchange_id,
            symbol: "BTCUSDT".to_string(),
            side: Side::Buy,
            quantity: dec!(2),
            filled_quantity: dec!(1),
            price: Some(dec!(50000)),
        });
        manager.reconcile().await.unwrap();
        adapter.open_orders.lock().unwrap().clear();

        let report = manager.reconcile().await.unwrap();
        assert_eq!(report.finalized_filled, 1);
        assert_eq!(
            store.get(order.id).await.unwrap().unwrap().status,
            OrderStatus::Filled
        );
    }
}
