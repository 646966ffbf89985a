//! Position ledger
//!
//! Tracks open positions and reconciles them against the exchange:
//!
//! ```text
//!   track ──> validate ──> initial mark ──> persist ──> live map
//!                                                          │
//!               sync loop: fetch_positions ────────────────┤
//!                 size == 0  => remove("closed")           │
//!                 size != 0  => overwrite size/price ──────┘
//! ```
//!
//! The exchange owns size and existence; the ledger owns derived metrics.
//! Each position lives behind its own `Arc<Mutex<_>>` inside a sharded map,
//! so syncing one symbol never blocks marking another.

use crate::error::{Error, Result};
use chrono::Utc;
use dashmap::DashMap;
use hermes_core::{
    HealthThresholds, PositionHealth, PositionMetrics, PositionSide, PositionStatus,
    TrackedPosition,
};
use hermes_ports::{ExecutionAdapter, PositionStore};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything needed to start tracking a freshly opened position.
#[derive(Debug, Clone)]
pub struct TrackRequest {
    pub id: String,
    pub symbol: String,
    pub side: PositionSide,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
}

impl TrackRequest {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        side: PositionSide,
        size: Decimal,
        entry_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            side,
            size,
            entry_price,
            stop_loss: None,
            take_profit: None,
        }
    }

    /// Builder: Set protective levels
    pub fn with_protection(
        mut self,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
    ) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }
}

/// Result of reconciling one position against the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Exchange still holds the position; local size/price were overwritten
    Updated,
    /// Exchange reports size zero; position was removed with reason `closed`
    Closed,
}

/// Aggregate view over all live positions
#[derive(Debug, Clone, Default)]
pub struct LedgerStats {
    pub active: usize,
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
    pub unknown: usize,
    pub total_unrealized_pnl: Decimal,
}

/// Tracks open positions, their metrics, and their exchange state.
pub struct PositionLedger {
    thresholds: HealthThresholds,
    adapter: Arc<dyn ExecutionAdapter>,
    store: Arc<dyn PositionStore>,
    live: DashMap<String, Arc<Mutex<TrackedPosition>>>,
}

impl PositionLedger {
    pub fn new(
        thresholds: HealthThresholds,
        adapter: Arc<dyn ExecutionAdapter>,
        store: Arc<dyn PositionStore>,
    ) -> Self {
        Self {
            thresholds,
            adapter,
            store,
            live: DashMap::new(),
        }
    }

    /// Start tracking a position.
    ///
    /// Invariants (size >= 0, protective-level orientation) are checked
    /// before anything is persisted; a malformed request never reaches the
    /// store. At most one live record exists per symbol: a second same-side
    /// track merges into the open record with a size-weighted entry price,
    /// so the sync loop never multiplies the exchange aggregate across
    /// duplicates. An initial mark is taken from the ticker so the record
    /// starts with live metrics; if the ticker is unavailable the position
    /// is still tracked with health `Unknown` until the next sync.
    pub async fn track(&self, request: TrackRequest) -> Result<TrackedPosition> {
        let mut position = TrackedPosition::new(
            request.id,
            request.symbol,
            request.side,
            request.size,
            request.entry_price,
        )
        .with_protection(request.stop_loss, request.take_profit);

        position.validate()?;

        let mark = match self.adapter.fetch_ticker(&position.symbol).await {
            Ok(ticker) => Some(ticker.last),
            Err(e) => {
                warn!(
                    "[LEDGER] No initial mark for {} ({}): {}",
                    position.id, position.symbol, e
                );
                None
            }
        };

        if let Some(arc) = self.arc_for_symbol(&position.symbol).await {
            let mut existing = arc.lock().await;
            if existing.side != position.side {
                // The exchange nets opposing fills into one aggregate and
                // owns the result; the next sync adopts it
                warn!(
                    "[LEDGER] {} {:?} fill against open {:?} {}, deferring to exchange sync",
                    position.symbol, position.side, existing.side, existing.id
                );
                return Ok(existing.clone());
            }

            let total = existing.size + position.size;
            if total > Decimal::ZERO {
                existing.entry_price = (existing.entry_price * existing.size
                    + position.entry_price * position.size)
                    / total;
            }
            existing.size = total;
            if position.stop_loss.is_some() {
                existing.stop_loss = position.stop_loss;
            }
            if position.take_profit.is_some() {
                existing.take_profit = position.take_profit;
            }
            existing.status = PositionStatus::Active;
            let mark = mark.unwrap_or(existing.current_price);
            existing.mark_to_market(mark, &self.thresholds, Utc::now());
            self.store.upsert(&existing).await?;

            info!(
                "[LEDGER] Merged {} into {}: {} {} @ {}",
                position.id, existing.id, existing.size, existing.symbol, existing.entry_price
            );
            return Ok(existing.clone());
        }

        if let Some(mark) = mark {
            position.mark_to_market(mark, &self.thresholds, Utc::now());
        }

        self.store.upsert(&position).await?;
        self.live
            .insert(position.id.clone(), Arc::new(Mutex::new(position.clone())));

        info!(
            "[LEDGER] Tracking {} {:?} {} {} @ {}",
            position.id, position.side, position.size, position.symbol, position.entry_price
        );
        Ok(position)
    }

    /// The live record holding a symbol, if any
    async fn arc_for_symbol(&self, symbol: &str) -> Option<Arc<Mutex<TrackedPosition>>> {
        let arcs: Vec<Arc<Mutex<TrackedPosition>>> = self
            .live
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for arc in arcs {
            if arc.lock().await.symbol == symbol {
                return Some(arc);
            }
        }
        None
    }

    /// Stop tracking a position and archive its final snapshot.
    ///
    /// The reason string maps to the terminal status: `closed` => Closed,
    /// `liquidated` => Liquidated, anything else => Error. Removing an id
    /// that is not tracked is a logged no-op, so callers racing the sync
    /// loop never fail. The terminal snapshot is persisted before the
    /// record leaves the live map; a failed write rolls the record back so
    /// the next sync tick can retry instead of stranding an Active row in
    /// the store.
    pub async fn remove(&self, id: &str, reason: &str) -> Result<Option<TrackedPosition>> {
        let Some(arc) = self.live.get(id).map(|entry| Arc::clone(entry.value())) else {
            debug!("[LEDGER] remove({id}, {reason}): not tracked, ignoring");
            return Ok(None);
        };

        let mut position = arc.lock().await;
        if position.status.is_terminal() {
            // Lost a race with another remover; just drop the map entry
            self.live.remove(id);
            return Ok(None);
        }

        let previous_status = position.status;
        position.status = match reason {
            "closed" => PositionStatus::Closed,
            "liquidated" => PositionStatus::Liquidated,
            other => {
                warn!("[LEDGER] Unrecognized removal reason '{other}' for {id}");
                PositionStatus::Error
            }
        };
        // Final snapshot: the open PnL is realized at the last mark
        let open_pnl = position.metrics.unrealized_pnl;
        position.metrics.realized_pnl += open_pnl;
        position.metrics.unrealized_pnl = Decimal::ZERO;
        position.updated_at = Utc::now();

        if let Err(e) = self.store.upsert(&position).await {
            position.status = previous_status;
            position.metrics.realized_pnl -= open_pnl;
            position.metrics.unrealized_pnl = open_pnl;
            warn!("[LEDGER] Failed to archive {id}, keeping it live: {e}");
            return Err(e.into());
        }
        self.live.remove(id);

        info!(
            "[LEDGER] Removed {} ({reason}): realized_pnl={}",
            position.id, position.metrics.realized_pnl
        );
        Ok(Some(position.clone()))
    }

    /// Refresh derived metrics for one position from the live ticker.
    pub async fn update_metrics(&self, id: &str) -> Result<PositionMetrics> {
        let arc = self
            .live
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::UnknownPosition(id.to_string()))?;

        let symbol = arc.lock().await.symbol.clone();
        let ticker = self.adapter.fetch_ticker(&symbol).await?;

        let mut position = arc.lock().await;
        let metrics = position
            .mark_to_market(ticker.last, &self.thresholds, Utc::now())
            .clone();
        self.store.upsert(&position).await?;

        debug!(
            "[LEDGER] {} marked @ {}: pnl={} roi={}% health={:?}",
            id, ticker.last, metrics.unrealized_pnl, metrics.roi_pct, position.health
        );
        Ok(metrics)
    }

    /// Reconcile one position against the exchange.
    ///
    /// The exchange is authoritative for size and existence: a reported size
    /// of zero (or an absent position) closes the local record, and a
    /// nonzero size overwrites the local one before metrics are recomputed.
    /// Local state is never pushed back to the exchange.
    pub async fn sync_with_exchange(&self, id: &str) -> Result<SyncOutcome> {
        let arc = self
            .live
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::UnknownPosition(id.to_string()))?;

        let symbol = arc.lock().await.symbol.clone();
        let reported = self
            .adapter
            .fetch_positions(std::slice::from_ref(&symbol))
            .await?
            .into_iter()
            .find(|p| p.symbol == symbol);

        let Some(exchange) = reported.filter(|p| !p.size.is_zero()) else {
            self.remove(id, "closed").await?;
            return Ok(SyncOutcome::Closed);
        };

        let mut position = arc.lock().await;
        if exchange.size < position.size && position.status == PositionStatus::Active {
            info!(
                "[LEDGER] {} partially closed on exchange: {} -> {}",
                id, position.size, exchange.size
            );
            position.status = PositionStatus::PartialClosed;
        }
        position.size = exchange.size;
        position.mark_to_market(exchange.mark_price, &self.thresholds, Utc::now());
        self.store.upsert(&position).await?;

        Ok(SyncOutcome::Updated)
    }

    /// Snapshot of one tracked position
    pub async fn position(&self, id: &str) -> Option<TrackedPosition> {
        let arc = self.live.get(id).map(|entry| Arc::clone(entry.value()))?;
        let position = arc.lock().await;
        Some(position.clone())
    }

    /// Ids of all tracked positions
    pub fn active_ids(&self) -> Vec<String> {
        self.live.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn active_count(&self) -> usize {
        self.live.len()
    }

    /// Snapshots of all tracked positions
    pub async fn active_positions(&self) -> Vec<TrackedPosition> {
        // Snapshot the Arcs first; holding a shard guard across an await
        // point could deadlock against writers.
        let arcs: Vec<Arc<Mutex<TrackedPosition>>> = self
            .live
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut positions = Vec::with_capacity(arcs.len());
        for arc in arcs {
            positions.push(arc.lock().await.clone());
        }
        positions
    }

    /// Sum of current notional across all tracked positions
    pub async fn total_exposure(&self) -> Decimal {
        self.active_positions()
            .await
            .iter()
            .map(|p| p.notional())
            .sum()
    }

    pub async fn stats(&self) -> LedgerStats {
        let mut stats = LedgerStats::default();
        for position in self.active_positions().await {
            stats.active += 1;
            stats.total_unrealized_pnl += position.metrics.unrealized_pnl;
            match position.health {
                PositionHealth::Healthy => stats.healthy += 1,
                PositionHealth::Warning => stats.warning += 1,
                PositionHealth::Critical => stats.critical += 1,
                PositionHealth::Unknown => stats.unknown += 1,
            }
        }
        stats
    }
}
