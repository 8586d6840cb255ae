//! Stock positions per store and transfers between stores.

mod levels;
mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::staff::{ItemId, StoreId};

pub use self::levels::{
    StockLevels, StockStatus, VELOCITY_WINDOW_DAYS, levels_from_velocity, stock_from_history,
};
pub use self::service::{
    CategoryInventory, InventoryFilter, InventoryItem, InventoryService, InventorySummary,
    LowStockReport, StoreInventory, TransferRequest,
};

/// Stored stock position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub store_id: StoreId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub reorder_level: i64,
    pub max_stock: i64,
    pub last_restocked: Option<DateTime<Utc>>,
}

impl StockRecord {
    pub fn status(&self) -> StockStatus {
        StockStatus::classify(self.quantity, self.reorder_level, self.max_stock)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u64)]
pub struct TransferId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    InTransit,
    Completed,
    Cancelled,
}

/// A movement of stock between two stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transfer {
    pub id: TransferId,
    pub from_store_id: StoreId,
    pub from_store_name: String,
    pub to_store_id: StoreId,
    pub to_store_name: String,
    pub item_id: ItemId,
    pub item_name: String,
    pub category: String,
    pub quantity: u32,
    pub status: TransferStatus,
    pub reason: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
