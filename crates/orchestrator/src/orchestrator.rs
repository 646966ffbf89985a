//! Trading orchestrator
//!
//! One task per concern, all bounded:
//!
//! - signal loop: drains the intake queue through the risk gate
//! - order loop: submits approved orders, starts position tracking
//! - sync loop: reconciles positions and orders against the exchange
//! - risk loop: re-marks positions, runs the portfolio monitor
//! - metrics loop: logs aggregate stats
//!
//! Every queue is bounded and enqueueing never blocks: a full queue is an
//! immediate, observable rejection. Shutdown is a watch channel every loop
//! selects on.

use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::state::PipelineState;
use hermes_core::{
    AccountState, OrderId, PositionSide, RiskAction, Signal, SignalSide, TrackedPosition,
};
use hermes_order_manager::{OrderManager, OrderStats, SubmitOutcome};
use hermes_position_ledger::{LedgerStats, PositionLedger, SyncOutcome, TrackRequest};
use hermes_ports::{ExecutionAdapter, OrderStore, PositionStore};
use hermes_risk_gate::{PortfolioRiskMonitor, RiskDecision, RiskGate};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// What the order loop does once an order is acknowledged.
///
/// Typed on purpose: the pipeline branches on this, never on metadata.
#[derive(Debug, Clone)]
pub enum OrderIntent {
    /// Opens a position; tracked in the ledger on acknowledgement
    Entry {
        side: PositionSide,
        entry_price: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
    },
    /// Closes (part of) a position; the sync loop observes the result
    Exit,
    /// Portfolio-level reduction ordered by the risk monitor
    RiskReduction,
}

/// A gate-approved order waiting for submission
#[derive(Debug, Clone)]
pub struct OrderWork {
    pub order_id: OrderId,
    pub intent: OrderIntent,
}

/// Point-in-time view of the pipeline for the status surface
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    pub state: PipelineState,
    pub signals_accepted: u64,
    pub signals_rejected: u64,
    pub orders: OrderStats,
    pub positions: LedgerStats,
}

/// Shared by the orchestrator handle and every worker task.
struct Inner {
    config: OrchestratorConfig,
    state: watch::Sender<PipelineState>,
    gate: RiskGate,
    monitor: PortfolioRiskMonitor,
    orders: Arc<OrderManager>,
    ledger: Arc<PositionLedger>,
    adapter: Arc<dyn ExecutionAdapter>,
    order_store: Arc<dyn OrderStore>,
    position_store: Arc<dyn PositionStore>,
    order_tx: mpsc::Sender<OrderWork>,
    signals_accepted: AtomicU64,
    signals_rejected: AtomicU64,
}

/// Wires signals through risk, orders and positions.
///
/// All collaborators are injected; the orchestrator owns no I/O of its own.
/// `start` may be called once per instance.
pub struct TradingOrchestrator {
    inner: Arc<Inner>,
    signal_tx: mpsc::Sender<Signal>,
    signal_rx: Mutex<Option<mpsc::Receiver<Signal>>>,
    order_rx: Mutex<Option<mpsc::Receiver<OrderWork>>>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TradingOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        adapter: Arc<dyn ExecutionAdapter>,
        order_store: Arc<dyn OrderStore>,
        position_store: Arc<dyn PositionStore>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(config.signal_queue_capacity);
        let (order_tx, order_rx) = mpsc::channel(config.order_queue_capacity);
        let (state, _) = watch::channel(PipelineState::Stopped);
        let (shutdown, _) = watch::channel(false);

        let orders = Arc::new(OrderManager::new(
            config.orders.clone(),
            Arc::clone(&adapter),
            Arc::clone(&order_store),
        ));
        let ledger = Arc::new(PositionLedger::new(
            config.thresholds.clone(),
            Arc::clone(&adapter),
            Arc::clone(&position_store),
        ));
        let gate = RiskGate::new(config.risk.clone());
        let monitor = PortfolioRiskMonitor::new(config.risk.clone());

        Self {
            inner: Arc::new(Inner {
                config,
                state,
                gate,
                monitor,
                orders,
                ledger,
                adapter,
                order_store,
                position_store,
                order_tx,
                signals_accepted: AtomicU64::new(0),
                signals_rejected: AtomicU64::new(0),
            }),
            signal_tx,
            signal_rx: Mutex::new(Some(signal_rx)),
            order_rx: Mutex::new(Some(order_rx)),
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Health-check every collaborator, then spawn the worker loops.
    ///
    /// A failed health check leaves the pipeline in `Error` and returns the
    /// failure; nothing is spawned and nothing is retried.
    pub async fn start(&self) -> Result<()> {
        let current = *self.inner.state.borrow();
        if current != PipelineState::Stopped {
            return Err(Error::InvalidState {
                actual: current,
                expected: PipelineState::Stopped,
            });
        }
        self.inner.state.send_replace(PipelineState::Starting);

        if let Err(e) = self.inner.adapter.health_check().await {
            self.inner.state.send_replace(PipelineState::Error);
            return Err(Error::StartupHealth(format!(
                "adapter {}: {e}",
                self.inner.adapter.name()
            )));
        }
        if let Err(e) = self.inner.order_store.health_check().await {
            self.inner.state.send_replace(PipelineState::Error);
            return Err(Error::StartupHealth(format!("order store: {e}")));
        }
        if let Err(e) = self.inner.position_store.health_check().await {
            self.inner.state.send_replace(PipelineState::Error);
            return Err(Error::StartupHealth(format!("position store: {e}")));
        }

        let (Some(signal_rx), Some(order_rx)) = (
            self.signal_rx.lock().await.take(),
            self.order_rx.lock().await.take(),
        ) else {
            self.inner.state.send_replace(PipelineState::Error);
            return Err(Error::StartupHealth(
                "receivers already consumed, orchestrator cannot be restarted".to_string(),
            ));
        };

        let mut tasks = self.tasks.lock().await;
        tasks.push(tokio::spawn(signal_loop(
            Arc::clone(&self.inner),
            signal_rx,
            self.shutdown.subscribe(),
        )));
        tasks.push(tokio::spawn(order_loop(
            Arc::clone(&self.inner),
            order_rx,
            self.shutdown.subscribe(),
        )));
        tasks.push(tokio::spawn(sync_loop(
            Arc::clone(&self.inner),
            self.shutdown.subscribe(),
        )));
        tasks.push(tokio::spawn(risk_loop(
            Arc::clone(&self.inner),
            self.shutdown.subscribe(),
        )));
        tasks.push(tokio::spawn(metrics_loop(
            Arc::clone(&self.inner),
            self.shutdown.subscribe(),
        )));

        self.inner.state.send_replace(PipelineState::Running);
        info!("[PIPE] running on adapter {}", self.inner.adapter.name());
        Ok(())
    }

    /// Signal shutdown and join every worker.
    ///
    /// Workers that fail to drain within the configured timeout are aborted
    /// and reported, never waited on forever.
    pub async fn stop(&self) -> Result<()> {
        let current = *self.inner.state.borrow();
        if current == PipelineState::Stopped {
            return Ok(());
        }
        self.inner.state.send_replace(PipelineState::Stopping);
        let _ = self.shutdown.send(true);

        let timeout = Duration::from_millis(self.inner.config.shutdown_timeout_ms);
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let abort = task.abort_handle();
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("[PIPE] worker failed during shutdown: {e}"),
                Err(_) => {
                    abort.abort();
                    warn!(
                        "[PIPE] worker did not drain within {}ms, aborted",
                        self.inner.config.shutdown_timeout_ms
                    );
                }
            }
        }

        self.inner.state.send_replace(PipelineState::Stopped);
        info!("[PIPE] stopped");
        Ok(())
    }

    /// Stop accepting signals. Queued work and internal risk flows keep
    /// running; `add_signal` rejects until `resume`.
    pub fn pause(&self) {
        if *self.inner.state.borrow() == PipelineState::Running {
            self.inner.state.send_replace(PipelineState::Paused);
            warn!("[PIPE] paused, rejecting signal intake");
        }
    }

    /// Resume signal intake after a pause.
    pub fn resume(&self) {
        if *self.inner.state.borrow() == PipelineState::Paused {
            self.inner.state.send_replace(PipelineState::Running);
            info!("[PIPE] resumed");
        }
    }

    /// Enqueue a signal for processing.
    ///
    /// Never blocks: a full queue or a non-accepting state is an immediate
    /// error and the signal is counted as rejected.
    pub fn add_signal(&self, signal: Signal) -> Result<()> {
        let state = *self.inner.state.borrow();
        if !state.accepts_signals() {
            self.inner.signals_rejected.fetch_add(1, Ordering::Relaxed);
            return Err(Error::NotAccepting(state));
        }
        match self.signal_tx.try_send(signal) {
            Ok(()) => {
                self.inner.signals_accepted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(signal)) => {
                self.inner.signals_rejected.fetch_add(1, Ordering::Relaxed);
                warn!("[PIPE] signal queue full, dropping {}", signal.id);
                Err(Error::Backpressure)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.inner.signals_rejected.fetch_add(1, Ordering::Relaxed);
                Err(Error::NotAccepting(state))
            }
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.inner.state.borrow()
    }

    /// Watch pipeline state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.inner.state.subscribe()
    }

    pub fn order_manager(&self) -> &Arc<OrderManager> {
        &self.inner.orders
    }

    pub fn position_ledger(&self) -> &Arc<PositionLedger> {
        &self.inner.ledger
    }

    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            state: *self.inner.state.borrow(),
            signals_accepted: self.inner.signals_accepted.load(Ordering::Relaxed),
            signals_rejected: self.inner.signals_rejected.load(Ordering::Relaxed),
            orders: self.inner.orders.stats(),
            positions: self.inner.ledger.stats().await,
        }
    }
}

impl Inner {
    /// Fresh account snapshot: balance from the adapter, exposure from the
    /// ledger. `None` when the balance fetch fails, so the gate fails closed.
    async fn account_state(&self) -> Option<AccountState> {
        match self.adapter.fetch_balance().await {
            Ok(balance) => Some(
                AccountState::new(balance)
                    .with_exposure(self.ledger.total_exposure().await, self.ledger.active_count()),
            ),
            Err(e) => {
                warn!("[PIPE] balance fetch failed: {e}");
                None
            }
        }
    }

    async fn handle_signal(&self, signal: Signal) {
        if let Err(e) = signal.validate() {
            warn!("[PIPE] dropping malformed signal {}: {e}", signal.id);
            self.signals_rejected.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if signal.side.is_entry() {
            if *self.state.borrow() == PipelineState::Paused {
                // Queued before the pause landed; entries do not survive it
                info!("[PIPE] paused, dropping entry signal for {}", signal.symbol);
                self.signals_rejected.fetch_add(1, Ordering::Relaxed);
                return;
            }
            self.handle_entry(signal).await;
        } else if signal.side.is_exit() {
            self.handle_exit(signal).await;
        } else {
            debug!("[PIPE] neutral signal for {}, nothing to do", signal.symbol);
        }
    }

    async fn handle_entry(&self, signal: Signal) {
        let account = self.account_state().await;
        let decision = self.gate.evaluate_opt(&signal, account.as_ref());
        let quantity = match &decision {
            RiskDecision::Approve { quantity } => *quantity,
            RiskDecision::Resize { quantity, reason } => {
                info!("[PIPE] {} resized: {reason}", signal.symbol);
                *quantity
            }
            RiskDecision::Reject { reason } => {
                info!(
                    "[PIPE] {} {:?} rejected by risk gate: {reason}",
                    signal.symbol, signal.side
                );
                self.signals_rejected.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let (Some(entry_price), Some(side)) = (
            signal.suggested_price,
            match signal.side {
                SignalSide::Long => Some(PositionSide::Long),
                SignalSide::Short => Some(PositionSide::Short),
                _ => None,
            },
        ) else {
            return;
        };

        match self.orders.create_from_signal(&signal, quantity).await {
            Ok(Some(order)) => {
                self.enqueue_order(OrderWork {
                    order_id: order.id,
                    intent: OrderIntent::Entry {
                        side,
                        entry_price,
                        stop_loss: signal.suggested_stop_loss,
                        take_profit: signal.suggested_take_profit,
                    },
                })
                .await;
            }
            Ok(None) => {}
            Err(e) => warn!("[PIPE] failed to create order for {}: {e}", signal.symbol),
        }
    }

    /// Exit signals bypass the gate; they only ever shrink exposure. The
    /// close quantity is the full tracked size.
    async fn handle_exit(&self, signal: Signal) {
        let target = match signal.side {
            SignalSide::CloseLong => PositionSide::Long,
            SignalSide::CloseShort => PositionSide::Short,
            _ => return,
        };

        let matching: Vec<TrackedPosition> = self
            .ledger
            .active_positions()
            .await
            .into_iter()
            .filter(|p| p.symbol == signal.symbol && p.side == target && p.size > Decimal::ZERO)
            .collect();

        if matching.is_empty() {
            info!(
                "[PIPE] {:?} {}: no tracked position to close",
                signal.side, signal.symbol
            );
            return;
        }

        for position in matching {
            match self.orders.create_from_signal(&signal, position.size).await {
                Ok(Some(order)) => {
                    self.enqueue_order(OrderWork {
                        order_id: order.id,
                        intent: OrderIntent::Exit,
                    })
                    .await;
                }
                Ok(None) => {}
                Err(e) => warn!(
                    "[PIPE] failed to create close order for {}: {e}",
                    position.id
                ),
            }
        }
    }

    /// Fail-fast handoff to the order loop. A full queue cancels the
    /// just-created pending order locally so no orphan survives.
    async fn enqueue_order(&self, work: OrderWork) {
        let order_id = work.order_id;
        if self.order_tx.try_send(work).is_err() {
            warn!("[PIPE] order queue full, cancelling {order_id}");
            if let Err(e) = self.orders.cancel(order_id).await {
                warn!("[PIPE] failed to cancel {order_id}: {e}");
            }
        }
    }

    async fn handle_order(&self, work: OrderWork) {
        match self.orders.submit(work.order_id).await {
            Ok(SubmitOutcome::Submitted { .. }) => {
                if let OrderIntent::Entry {
                    side,
                    entry_price,
                    stop_loss,
                    take_profit,
                } = work.intent
                {
                    let Some(order) = self.orders.order(work.order_id).await else {
                        return;
                    };
                    let request = TrackRequest::new(
                        order.id.to_string(),
                        order.symbol.clone(),
                        side,
                        order.quantity,
                        entry_price,
                    )
                    .with_protection(stop_loss, take_profit);
                    if let Err(e) = self.ledger.track(request).await {
                        warn!("[PIPE] failed to track position for {}: {e}", order.id);
                    }
                }
            }
            Ok(SubmitOutcome::DuplicateSuppressed) => {}
            Ok(SubmitOutcome::Rejected { reason }) => {
                debug!("[PIPE] {} rejected: {reason}", work.order_id);
            }
            Err(e) => warn!("[PIPE] submit {} failed: {e}", work.order_id),
        }
    }

    /// One reconciliation pass over every position, then the order book.
    /// Per-id failures are logged and retried on the next tick.
    async fn sync_tick(&self) {
        for id in self.ledger.active_ids() {
            match self.ledger.sync_with_exchange(&id).await {
                Ok(SyncOutcome::Closed) => info!("[PIPE] position {id} closed on exchange"),
                Ok(SyncOutcome::Updated) => {}
                Err(e) => warn!("[PIPE] sync {id} failed, will retry: {e}"),
            }
        }
        if let Err(e) = self.orders.reconcile().await {
            warn!("[PIPE] order reconciliation failed: {e}");
        }
    }

    async fn risk_tick(&self) {
        // Fresh marks before judging the portfolio
        for id in self.ledger.active_ids() {
            if let Err(e) = self.ledger.update_metrics(&id).await {
                debug!("[PIPE] mark {id} failed: {e}");
            }
        }

        let Some(account) = self.account_state().await else {
            warn!("[PIPE] risk check skipped, account state unavailable");
            return;
        };
        let positions = self.ledger.active_positions().await;
        let status = self.monitor.check(&positions, &account);

        match status.action {
            Some(RiskAction::Pause) => {
                if *self.state.borrow() == PipelineState::Running {
                    self.state.send_replace(PipelineState::Paused);
                    warn!("[PIPE] paused by risk monitor: {}", status.reason);
                }
            }
            Some(RiskAction::ReducePositions) => {
                warn!("[PIPE] reducing positions: {}", status.reason);
                self.reduce_positions(&positions).await;
            }
            None => {}
        }
    }

    /// Emit closing orders for a fraction of every open position's size.
    async fn reduce_positions(&self, positions: &[TrackedPosition]) {
        for position in positions {
            let quantity = position.size * self.config.risk.reduce_fraction;
            if quantity <= Decimal::ZERO {
                continue;
            }
            let side = match position.side {
                PositionSide::Long => SignalSide::CloseLong,
                PositionSide::Short => SignalSide::CloseShort,
            };
            let signal = Signal::new("risk_reduction", position.symbol.clone(), side)
                .with_metadata("reason", "risk_reduction");

            match self.orders.create_from_signal(&signal, quantity).await {
                Ok(Some(order)) => {
                    self.enqueue_order(OrderWork {
                        order_id: order.id,
                        intent: OrderIntent::RiskReduction,
                    })
                    .await;
                }
                Ok(None) => {}
                Err(e) => warn!("[PIPE] failed to create reduce order for {}: {e}", position.id),
            }
        }
    }

    async fn metrics_tick(&self) {
        let orders = self.orders.stats();
        let positions = self.ledger.stats().await;
        info!(
            "[PIPE] state={} signals={}/{} orders: submitted={} suppressed={} rejected={} \
             cancelled={} positions: active={} pnl={}",
            *self.state.borrow(),
            self.signals_accepted.load(Ordering::Relaxed),
            self.signals_rejected.load(Ordering::Relaxed),
            orders.submitted,
            orders.duplicates_suppressed,
            orders.rejected,
            orders.cancelled,
            positions.active,
            positions.total_unrealized_pnl,
        );
    }
}

async fn signal_loop(
    inner: Arc<Inner>,
    mut rx: mpsc::Receiver<Signal>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("[PIPE] signal loop up");
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            maybe = rx.recv() => match maybe {
                Some(signal) => inner.handle_signal(signal).await,
                None => break,
            },
        }
    }
    debug!("[PIPE] signal loop down");
}

async fn order_loop(
    inner: Arc<Inner>,
    mut rx: mpsc::Receiver<OrderWork>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("[PIPE] order loop up");
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            maybe = rx.recv() => match maybe {
                Some(work) => inner.handle_order(work).await,
                None => break,
            },
        }
    }
    debug!("[PIPE] order loop down");
}

async fn sync_loop(inner: Arc<Inner>, mut shutdown: watch::Receiver<bool>) {
    let mut interval =
        tokio::time::interval(Duration::from_millis(inner.config.sync_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => inner.sync_tick().await,
        }
    }
    debug!("[PIPE] sync loop down");
}

async fn risk_loop(inner: Arc<Inner>, mut shutdown: watch::Receiver<bool>) {
    let mut interval =
        tokio::time::interval(Duration::from_millis(inner.config.risk_check_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => inner.risk_tick().await,
        }
    }
    debug!("[PIPE] risk loop down");
}

async fn metrics_loop(inner: Arc<Inner>, mut shutdown: watch::Receiver<bool>) {
    let mut interval =
        tokio::time::interval(Duration::from_millis(inner.config.metrics_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => inner.metrics_tick().await,
        }
    }
    debug!("[PIPE] metrics loop down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use hermes_ports::{
        AdapterError, AdapterResult, ExchangeOrder, ExchangePosition, MemoryOrderStore,
        MemoryPositionStore, PlaceOrderAck, PlaceOrderRequest, Ticker,
    };
    use rust_decimal_macros::dec;

    #[derive(Default)]
    struct MockAdapter {
        fail_health: bool,
    }

    #[async_trait]
    impl ExecutionAdapter for MockAdapter {
        async fn place_order(&self, request: &PlaceOrderRequest) -> AdapterResult<PlaceOrderAck> {
            Ok(PlaceOrderAck {
                exchange_id: format!("EX-{}", request.client_order_id),
                accepted_at: Utc::now(),
            })
        }

        async fn cancel_order(&self, _exchange_id: &str, _symbol: &str) -> AdapterResult<bool> {
            Ok(true)
        }

        async fn fetch_open_orders(&self) -> AdapterResult<Vec<ExchangeOrder>> {
            Ok(Vec::new())
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
            if self.fail_health {
                return Err(AdapterError::Connection("exchange unreachable".to_string()));
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn orchestrator_with(config: OrchestratorConfig, adapter: MockAdapter) -> TradingOrchestrator {
        TradingOrchestrator::new(
            config,
            Arc::new(adapter),
            Arc::new(MemoryOrderStore::new()),
            Arc::new(MemoryPositionStore::new()),
        )
    }

    fn entry_signal() -> Signal {
        Signal::new("momentum", "BTCUSDT", SignalSide::Long)
            .with_price(dec!(50000))
            .with_stop_loss(dec!(49000))
    }

    #[tokio::test]
    async fn test_signals_rejected_while_stopped() {
        let orchestrator =
            orchestrator_with(OrchestratorConfig::default(), MockAdapter::default());

        let result = orchestrator.add_signal(entry_signal());
        assert!(matches!(result, Err(Error::NotAccepting(PipelineState::Stopped))));
        assert_eq!(orchestrator.status().await.signals_rejected, 1);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_immediately() {
        let config = OrchestratorConfig {
            signal_queue_capacity: 2,
            ..OrchestratorConfig::default()
        };
        let orchestrator = orchestrator_with(config, MockAdapter::default());
        // Mark running without spawning consumers so the queue stays full
        orchestrator.inner.state.send_replace(PipelineState::Running);

        assert!(orchestrator.add_signal(entry_signal()).is_ok());
        assert!(orchestrator.add_signal(entry_signal()).is_ok());
        assert!(matches!(
            orchestrator.add_signal(entry_signal()),
            Err(Error::Backpressure)
        ));

        let status = orchestrator.status().await;
        assert_eq!(status.signals_accepted, 2);
        assert_eq!(status.signals_rejected, 1);
    }

    #[tokio::test]
    async fn test_failed_health_check_leaves_error_state() {
        let orchestrator = orchestrator_with(
            OrchestratorConfig::default(),
            MockAdapter { fail_health: true },
        );

        let result = orchestrator.start().await;
        assert!(matches!(result, Err(Error::StartupHealth(_))));
        assert_eq!(orchestrator.state(), PipelineState::Error);
        // Nothing was spawned
        assert!(orchestrator.tasks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let orchestrator =
            orchestrator_with(OrchestratorConfig::default(), MockAdapter::default());

        orchestrator.start().await.unwrap();
        assert_eq!(orchestrator.state(), PipelineState::Running);

        // Double start is an invalid transition
        assert!(matches!(
            orchestrator.start().await,
            Err(Error::InvalidState { .. })
        ));

        orchestrator.pause();
        assert_eq!(orchestrator.state(), PipelineState::Paused);
        // Paused rejects intake outright
        assert!(matches!(
            orchestrator.add_signal(entry_signal()),
            Err(Error::NotAccepting(PipelineState::Paused))
        ));

        orchestrator.resume();
        assert_eq!(orchestrator.state(), PipelineState::Running);

        orchestrator.stop().await.unwrap();
        assert_eq!(orchestrator.state(), PipelineState::Stopped);
        assert!(matches!(
            orchestrator.add_signal(entry_signal()),
            Err(Error::NotAccepting(_))
        ));

        // Stopping again is a no-op
        orchestrator.stop().await.unwrap();
    }
}
