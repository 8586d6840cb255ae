//! Inventory queries and stock transfers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use super::{StockRecord, StockStatus, Transfer, TransferStatus};
use crate::domain::catalogue::{CURRENCY, CatalogueItem, Store, round2};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{
    InventoryRepository, InventoryRepositoryError, StoreCatalogue, StoreCatalogueError,
};
use crate::domain::read_model::ReadModels;
use crate::domain::staff::{ItemId, StaffMember, StoreId, StoreScope};
use crate::domain::Error;

const DEFAULT_LOW_STOCK_LIMIT: u32 = 20;
const MAX_LOW_STOCK_LIMIT: u32 = 100;
const STORE_PAGE: u32 = 100;

/// An item's stock at a store, joined with catalogue data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventoryItem {
    pub item_id: ItemId,
    pub item_name: String,
    pub category: String,
    pub store_id: StoreId,
    pub store_name: String,
    pub quantity: i64,
    pub reorder_level: i64,
    pub max_stock_level: i64,
    pub unit_cost: f64,
    pub stock_value: f64,
    pub last_restocked: Option<chrono::DateTime<chrono::Utc>>,
    pub status: StockStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventorySummary {
    pub total_items: usize,
    pub total_value: f64,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    pub overstocked_count: usize,
    pub pending_transfers: usize,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryInventory {
    pub category: String,
    pub item_count: usize,
    pub total_quantity: i64,
    pub total_value: f64,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StoreInventory {
    pub store: Store,
    pub summary: InventorySummary,
    pub items: Vec<InventoryItem>,
    pub total_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LowStockReport {
    pub items: Vec<InventoryItem>,
    pub total: usize,
}

/// Filters for the item list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryFilter {
    pub store_id: Option<StoreId>,
    pub category: Option<String>,
    pub status: Option<StockStatus>,
    pub search: Option<String>,
}

/// Body of `POST /transfer`.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub from_store_id: StoreId,
    pub to_store_id: StoreId,
    pub item_id: ItemId,
    pub quantity: u32,
    #[serde(default)]
    pub reason: String,
}

fn map_inventory_error(err: InventoryRepositoryError) -> Error {
    match err {
        InventoryRepositoryError::Unavailable { message } => {
            Error::service_unavailable(format!("inventory unavailable: {message}"))
        }
        InventoryRepositoryError::InsufficientStock {
            available,
            requested,
        } => Error::invalid_request(format!(
            "insufficient stock: {available} available, {requested} requested"
        ))
        .with_details(json!({ "code": "insufficient_stock", "available": available })),
        InventoryRepositoryError::UnknownStock { store_id, item_id } => {
            Error::not_found(format!("item {item_id} is not stocked at store {store_id}"))
        }
    }
}

fn map_catalogue_error(err: StoreCatalogueError) -> Error {
    match err {
        StoreCatalogueError::Unavailable { message } => {
            Error::service_unavailable(format!("catalogue unavailable: {message}"))
        }
    }
}

fn summarise(items: &[InventoryItem], pending_transfers: usize) -> InventorySummary {
    let count = |status: StockStatus| items.iter().filter(|item| item.status == status).count();
    InventorySummary {
        total_items: items.len(),
        total_value: round2(items.iter().map(|item| item.stock_value).sum()),
        low_stock_count: count(StockStatus::LowStock),
        out_of_stock_count: count(StockStatus::OutOfStock),
        overstocked_count: count(StockStatus::Overstocked),
        pending_transfers,
        currency: CURRENCY.to_owned(),
    }
}

fn check_scope(actor: &StaffMember, store_id: Option<StoreId>) -> Result<(), Error> {
    match store_id {
        Some(id) if !actor.scope.contains(id) => Err(Error::forbidden(format!(
            "store {id} is outside your scope"
        ))),
        _ => Ok(()),
    }
}

/// Inventory use cases.
#[derive(Clone)]
pub struct InventoryService {
    inventory: Arc<dyn InventoryRepository>,
    catalogue: Arc<dyn StoreCatalogue>,
    read_models: ReadModels,
    clock: Arc<dyn Clock>,
}

impl InventoryService {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        catalogue: Arc<dyn StoreCatalogue>,
        read_models: ReadModels,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inventory,
            catalogue,
            read_models,
            clock,
        }
    }

    /// Stock joined with catalogue data, limited to `scope`.
    pub async fn positions(
        &self,
        scope: &StoreScope,
        store_id: Option<StoreId>,
    ) -> Result<Vec<InventoryItem>, Error> {
        let stores: HashMap<StoreId, Store> = self
            .catalogue
            .stores()
            .await
            .map_err(map_catalogue_error)?
            .into_iter()
            .map(|store| (store.id, store))
            .collect();
        let items: HashMap<ItemId, CatalogueItem> = self
            .catalogue
            .items()
            .await
            .map_err(map_catalogue_error)?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();
        let records = self
            .inventory
            .stock(store_id)
            .await
            .map_err(map_inventory_error)?;
        Ok(scope
            .filter(records, |record| record.store_id)
            .into_iter()
            .filter_map(|record| {
                let store = stores.get(&record.store_id)?;
                let item = items.get(&record.item_id)?;
                Some(join(&record, store, item))
            })
            .collect())
    }

    async fn pending_transfers(&self, actor: &StaffMember) -> Result<usize, Error> {
        let transfers = self
            .inventory
            .transfers()
            .await
            .map_err(map_inventory_error)?;
        Ok(transfers
            .iter()
            .filter(|t| matches!(t.status, TransferStatus::Pending | TransferStatus::InTransit))
            .filter(|t| actor.scope.contains(t.from_store_id) || actor.scope.contains(t.to_store_id))
            .count())
    }

    /// Totals and status counts, optionally for one store.
    pub async fn summary(
        &self,
        actor: &StaffMember,
        store_id: Option<StoreId>,
    ) -> Result<InventorySummary, Error> {
        check_scope(actor, store_id)?;
        let params = json!({ "store_id": store_id, "scope": actor.scope });
        self.read_models
            .get_or_compute("inventory-summary", &params, || async {
                let items = self.positions(&actor.scope, store_id).await?;
                let pending = self.pending_transfers(actor).await?;
                Ok(summarise(&items, pending))
            })
            .await
    }

    /// Filtered, paginated items; out-of-stock first, then low, then by name.
    pub async fn items(
        &self,
        actor: &StaffMember,
        filter: &InventoryFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryItem>, Error> {
        check_scope(actor, filter.store_id)?;
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let mut items: Vec<InventoryItem> = self
            .positions(&actor.scope, filter.store_id)
            .await?
            .into_iter()
            .filter(|item| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|category| item.category.eq_ignore_ascii_case(category))
            })
            .filter(|item| filter.status.is_none_or(|status| item.status == status))
            .filter(|item| {
                needle
                    .as_deref()
                    .is_none_or(|needle| item.item_name.to_lowercase().contains(needle))
            })
            .collect();
        items.sort_by(|a, b| {
            a.status
                .urgency()
                .cmp(&b.status.urgency())
                .then_with(|| a.item_name.cmp(&b.item_name))
                .then(a.store_id.cmp(&b.store_id))
        });
        Ok(page.apply(items))
    }

    /// Low and out-of-stock items, emptiest first.
    pub async fn low_stock(
        &self,
        actor: &StaffMember,
        store_id: Option<StoreId>,
        limit: Option<u32>,
    ) -> Result<LowStockReport, Error> {
        check_scope(actor, store_id)?;
        let limit = limit.unwrap_or(DEFAULT_LOW_STOCK_LIMIT);
        if limit == 0 || limit > MAX_LOW_STOCK_LIMIT {
            return Err(Error::invalid_request(format!(
                "limit must be between 1 and {MAX_LOW_STOCK_LIMIT}"
            )));
        }
        let mut items: Vec<InventoryItem> = self
            .positions(&actor.scope, store_id)
            .await?
            .into_iter()
            .filter(|item| matches!(item.status, StockStatus::LowStock | StockStatus::OutOfStock))
            .collect();
        items.sort_by(|a, b| a.quantity.cmp(&b.quantity).then(a.item_id.cmp(&b.item_id)));
        let total = items.len();
        items.truncate(limit as usize);
        Ok(LowStockReport { items, total })
    }

    /// Per-category totals across visible stores.
    pub async fn categories(&self, actor: &StaffMember) -> Result<Vec<CategoryInventory>, Error> {
        let params = json!({ "scope": actor.scope });
        self.read_models
            .get_or_compute("inventory-categories", &params, || async {
                let mut by_category: BTreeMap<String, CategoryInventory> = BTreeMap::new();
                for item in self.positions(&actor.scope, None).await? {
                    let entry = by_category
                        .entry(item.category.clone())
                        .or_insert_with(|| CategoryInventory {
                            category: item.category.clone(),
                            item_count: 0,
                            total_quantity: 0,
                            total_value: 0.0,
                            low_stock_count: 0,
                            out_of_stock_count: 0,
                        });
                    entry.item_count += 1;
                    entry.total_quantity += item.quantity;
                    entry.total_value = round2(entry.total_value + item.stock_value);
                    match item.status {
                        StockStatus::LowStock => entry.low_stock_count += 1,
                        StockStatus::OutOfStock => entry.out_of_stock_count += 1,
                        StockStatus::InStock | StockStatus::Overstocked => {}
                    }
                }
                let mut categories: Vec<CategoryInventory> = by_category.into_values().collect();
                categories.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
                Ok(categories)
            })
            .await
    }

    /// One store's items and summary.
    pub async fn store(
        &self,
        actor: &StaffMember,
        store_id: StoreId,
        category: Option<String>,
    ) -> Result<StoreInventory, Error> {
        check_scope(actor, Some(store_id))?;
        let store = self
            .catalogue
            .store(store_id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| Error::not_found(format!("store {store_id} not found")))?;
        let summary = self.summary(actor, Some(store_id)).await?;
        let filter = InventoryFilter {
            store_id: Some(store_id),
            category,
            ..InventoryFilter::default()
        };
        let page = PageRequest::new(Some(1), Some(STORE_PAGE), STORE_PAGE, STORE_PAGE)
            .map_err(|err| Error::internal(err.to_string()))?;
        let items = self.items(actor, &filter, page).await?;
        Ok(StoreInventory {
            store,
            summary,
            total_items: items.total,
            items: items.items,
        })
    }

    /// Transfers touching a visible store, newest first.
    pub async fn transfers(
        &self,
        actor: &StaffMember,
        status: Option<TransferStatus>,
        page: PageRequest,
    ) -> Result<Page<Transfer>, Error> {
        let mut transfers: Vec<Transfer> = self
            .inventory
            .transfers()
            .await
            .map_err(map_inventory_error)?
            .into_iter()
            .filter(|t| actor.scope.contains(t.from_store_id) || actor.scope.contains(t.to_store_id))
            .filter(|t| status.is_none_or(|status| t.status == status))
            .collect();
        transfers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page.apply(transfers))
    }

    /// Move stock between two stores in the caller's scope.
    pub async fn transfer(
        &self,
        actor: &StaffMember,
        request: TransferRequest,
    ) -> Result<Transfer, Error> {
        if !actor.permissions().can_manage_inventory {
            return Err(Error::forbidden("not authorised to create transfers"));
        }
        if !actor.scope.contains(request.from_store_id) || !actor.scope.contains(request.to_store_id) {
            return Err(Error::forbidden("access denied to one or both stores"));
        }
        if request.from_store_id == request.to_store_id {
            return Err(Error::invalid_request("source and destination must differ")
                .with_details(json!({ "field": "to_store_id", "code": "same_store" })));
        }
        if request.quantity == 0 {
            return Err(Error::invalid_request("quantity must be greater than zero")
                .with_details(json!({ "field": "quantity", "code": "must_be_positive" })));
        }
        let store_name = |id: StoreId| async move {
            self.catalogue
                .store(id)
                .await
                .map_err(map_catalogue_error)?
                .map(|store| store.name)
                .ok_or_else(|| Error::not_found(format!("store {id} not found")))
        };
        let from_store_name = store_name(request.from_store_id).await?;
        let to_store_name = store_name(request.to_store_id).await?;
        let item = self
            .catalogue
            .item(request.item_id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| Error::not_found(format!("item {} not found", request.item_id)))?;
        let now = self.clock.utc();
        let transfer = Transfer {
            id: self
                .inventory
                .next_transfer_id()
                .await
                .map_err(map_inventory_error)?,
            from_store_id: request.from_store_id,
            from_store_name,
            to_store_id: request.to_store_id,
            to_store_name,
            item_id: item.id,
            item_name: item.name,
            category: item.category,
            quantity: request.quantity,
            status: TransferStatus::Completed,
            reason: request.reason,
            created_by: actor.display_name(),
            created_at: now,
            completed_at: Some(now),
        };
        self.inventory
            .transfer(&transfer)
            .await
            .map_err(map_inventory_error)?;
        info!(
            transfer_id = transfer.id.0,
            from = transfer.from_store_id,
            to = transfer.to_store_id,
            quantity = transfer.quantity,
            "stock transferred"
        );
        Ok(transfer)
    }
}

fn join(record: &StockRecord, store: &Store, item: &CatalogueItem) -> InventoryItem {
    InventoryItem {
        item_id: item.id,
        item_name: item.name.clone(),
        category: item.category.clone(),
        store_id: store.id,
        store_name: store.name.clone(),
        quantity: record.quantity,
        reorder_level: record.reorder_level,
        max_stock_level: record.max_stock,
        unit_cost: item.unit_cost,
        stock_value: round2(record.quantity.max(0) as f64 * item.unit_cost),
        last_restocked: record.last_restocked,
        status: record.status(),
    }
}
