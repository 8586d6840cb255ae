//! Port for stock levels and transfer records.

use async_trait::async_trait;

use crate::domain::{ItemId, StockRecord, StoreId, Transfer, TransferId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by inventory repositories.
    pub enum InventoryRepositoryError {
        /// Storage could not be reached.
        Unavailable { message: String } => "inventory repository unavailable: {message}",
        /// No stock record exists for the pair.
        UnknownStock { store_id: StoreId, item_id: ItemId } =>
            "no stock record for item {item_id} at store {store_id}",
        /// The adjustment would take stock below zero.
        InsufficientStock { available: i64, requested: i64 } =>
            "insufficient stock: {available} available, {requested} requested",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Stock records, optionally restricted to one store.
    async fn stock(
        &self,
        store_id: Option<StoreId>,
    ) -> Result<Vec<StockRecord>, InventoryRepositoryError>;

    /// Add `delta` units (negative to remove) and return the new quantity.
    /// A missing record is created when `delta` is positive.
    async fn adjust(
        &self,
        store_id: StoreId,
        item_id: ItemId,
        delta: i64,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<i64, InventoryRepositoryError>;

    /// Move stock between stores atomically and record the transfer.
    async fn transfer(&self, transfer: &Transfer) -> Result<(), InventoryRepositoryError>;

    async fn next_transfer_id(&self) -> Result<TransferId, InventoryRepositoryError>;

    /// Every transfer, oldest first.
    async fn transfers(&self) -> Result<Vec<Transfer>, InventoryRepositoryError>;
}
