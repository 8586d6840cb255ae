//! Stock positions and transfers kept in process memory.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::inventory::levels_from_velocity;
use crate::domain::ports::{InventoryRepository, InventoryRepositoryError};
use crate::domain::{ItemId, StockRecord, StoreId, Transfer, TransferId};

type StockKey = (StoreId, ItemId);

#[derive(Debug, Default)]
struct State {
    stock: BTreeMap<StockKey, StockRecord>,
    transfers: Vec<Transfer>,
}

/// Stock keyed by store and item.
///
/// Adjustments and transfers take one write lock, so a transfer debits and
/// credits atomically.
#[derive(Debug, Default)]
pub struct MemoryInventoryRepository {
    state: RwLock<State>,
    transfer_sequence: AtomicU64,
}

impl MemoryInventoryRepository {
    pub fn new(records: Vec<StockRecord>) -> Self {
        let stock = records
            .into_iter()
            .map(|record| ((record.store_id, record.item_id), record))
            .collect();
        Self {
            state: RwLock::new(State {
                stock,
                transfers: Vec::new(),
            }),
            transfer_sequence: AtomicU64::new(0),
        }
    }
}

/// A record for an item the store has never stocked, with slow-mover levels.
fn empty_record(store_id: StoreId, item_id: ItemId) -> StockRecord {
    let levels = levels_from_velocity(0, 0.0);
    StockRecord {
        store_id,
        item_id,
        quantity: 0,
        reorder_level: levels.reorder_level,
        max_stock: levels.max_stock,
        last_restocked: None,
    }
}

fn apply(
    stock: &mut BTreeMap<StockKey, StockRecord>,
    store_id: StoreId,
    item_id: ItemId,
    delta: i64,
    at: DateTime<Utc>,
) -> Result<i64, InventoryRepositoryError> {
    if delta < 0 && !stock.contains_key(&(store_id, item_id)) {
        return Err(InventoryRepositoryError::unknown_stock(store_id, item_id));
    }
    let record = stock
        .entry((store_id, item_id))
        .or_insert_with(|| empty_record(store_id, item_id));
    let updated = record.quantity + delta;
    if updated < 0 {
        return Err(InventoryRepositoryError::insufficient_stock(
            record.quantity,
            -delta,
        ));
    }
    record.quantity = updated;
    if delta > 0 {
        record.last_restocked = Some(at);
    }
    Ok(updated)
}

#[async_trait]
impl InventoryRepository for MemoryInventoryRepository {
    async fn stock(
        &self,
        store_id: Option<StoreId>,
    ) -> Result<Vec<StockRecord>, InventoryRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .stock
            .values()
            .filter(|record| store_id.is_none_or(|id| record.store_id == id))
            .cloned()
            .collect())
    }

    async fn adjust(
        &self,
        store_id: StoreId,
        item_id: ItemId,
        delta: i64,
        at: DateTime<Utc>,
    ) -> Result<i64, InventoryRepositoryError> {
        apply(&mut self.state.write().await.stock, store_id, item_id, delta, at)
    }

    async fn transfer(&self, transfer: &Transfer) -> Result<(), InventoryRepositoryError> {
        let mut state = self.state.write().await;
        let quantity = i64::from(transfer.quantity);
        let at = transfer.completed_at.unwrap_or(transfer.created_at);
        apply(
            &mut state.stock,
            transfer.from_store_id,
            transfer.item_id,
            -quantity,
            at,
        )?;
        apply(
            &mut state.stock,
            transfer.to_store_id,
            transfer.item_id,
            quantity,
            at,
        )?;
        state.transfers.push(transfer.clone());
        Ok(())
    }

    async fn next_transfer_id(&self) -> Result<TransferId, InventoryRepositoryError> {
        Ok(TransferId(
            self.transfer_sequence.fetch_add(1, Ordering::SeqCst) + 1,
        ))
    }

    async fn transfers(&self) -> Result<Vec<Transfer>, InventoryRepositoryError> {
        Ok(self.state.read().await.transfers.clone())
    }
}
