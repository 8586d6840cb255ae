//! Decorators that answer reads from the demo dataset when the primary
//! source fails or comes back empty.
//!
//! Writes always go to the primary. A fallback answer is logged at `warn`
//! with the port name so an outage is visible even though callers never see
//! an empty dashboard.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use crate::domain::ports::{
    InventoryRepository, InventoryRepositoryError, PromotionRepository, PromotionRepositoryError,
    SalesHistory, SalesHistoryError, StaffDirectory, StaffDirectoryError, StoreCatalogue,
    StoreCatalogueError,
};
use crate::domain::{
    CatalogueItem, DailySales, ItemId, LoginCredentials, Promotion, PromotionId, SaleEvent,
    SaleId, StaffId, StaffMember, StockRecord, Store, StoreId, Transfer, TransferId,
};
use crate::outbound::memory::DemoData;

/// The primary's rows, or `mock` when the primary failed or had none.
fn or_mock<T: Clone, E: Display>(port: &'static str, primary: Result<Vec<T>, E>, mock: &[T]) -> Vec<T> {
    match primary {
        Ok(rows) if !rows.is_empty() => rows,
        Ok(_) => {
            warn!(port, "primary source returned no rows; serving mock data");
            mock.to_vec()
        }
        Err(err) => {
            warn!(port, error = %err, "primary source failed; serving mock data");
            mock.to_vec()
        }
    }
}

pub struct FallbackCatalogue {
    primary: Arc<dyn StoreCatalogue>,
    stores: Vec<Store>,
    items: Vec<CatalogueItem>,
}

impl FallbackCatalogue {
    pub fn new(primary: Arc<dyn StoreCatalogue>, demo: &DemoData) -> Self {
        Self {
            primary,
            stores: demo.stores.clone(),
            items: demo.items.clone(),
        }
    }
}

#[async_trait]
impl StoreCatalogue for FallbackCatalogue {
    async fn stores(&self) -> Result<Vec<Store>, StoreCatalogueError> {
        Ok(or_mock("stores", self.primary.stores().await, &self.stores))
    }

    async fn items(&self) -> Result<Vec<CatalogueItem>, StoreCatalogueError> {
        Ok(or_mock("items", self.primary.items().await, &self.items))
    }
}

/// Sales history whose daily rows fall back to generated history.
pub struct FallbackSalesHistory {
    primary: Arc<dyn SalesHistory>,
    daily: Vec<DailySales>,
}

impl FallbackSalesHistory {
    pub fn new(primary: Arc<dyn SalesHistory>, demo: &DemoData) -> Self {
        Self {
            primary,
            daily: demo.sales.clone(),
        }
    }
}

#[async_trait]
impl SalesHistory for FallbackSalesHistory {
    async fn daily(&self, since: NaiveDate) -> Result<Vec<DailySales>, SalesHistoryError> {
        let mock: Vec<DailySales> = self
            .daily
            .iter()
            .filter(|row| row.date >= since)
            .cloned()
            .collect();
        Ok(or_mock("sales_history", self.primary.daily(since).await, &mock))
    }

    async fn next_sale_id(&self) -> Result<SaleId, SalesHistoryError> {
        self.primary.next_sale_id().await
    }

    async fn record(&self, sale: &SaleEvent, revenue: f64) -> Result<(), SalesHistoryError> {
        self.primary.record(sale, revenue).await
    }

    async fn latest(&self, limit: usize) -> Result<Vec<SaleEvent>, SalesHistoryError> {
        // An empty live buffer is normal right after start-up.
        self.primary.latest(limit).await
    }
}

/// Staff directory whose listing falls back to the generated staff.
///
/// Sign-in and session lookups never fall back: a member the primary does
/// not know cannot authenticate.
pub struct FallbackStaffDirectory {
    primary: Arc<dyn StaffDirectory>,
    staff: Vec<StaffMember>,
}

impl FallbackStaffDirectory {
    pub fn new(primary: Arc<dyn StaffDirectory>, demo: &DemoData) -> Self {
        Self {
            primary,
            staff: demo.staff.clone(),
        }
    }
}

#[async_trait]
impl StaffDirectory for FallbackStaffDirectory {
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<StaffMember>, StaffDirectoryError> {
        self.primary.authenticate(credentials).await
    }

    async fn find(&self, id: &StaffId) -> Result<Option<StaffMember>, StaffDirectoryError> {
        self.primary.find(id).await
    }

    async fn list(&self) -> Result<Vec<StaffMember>, StaffDirectoryError> {
        Ok(or_mock("staff_directory", self.primary.list().await, &self.staff))
    }
}

/// Inventory whose stock levels fall back to levels derived from the
/// generated history.
pub struct FallbackInventory {
    primary: Arc<dyn InventoryRepository>,
    stock: Vec<StockRecord>,
}

impl FallbackInventory {
    pub fn new(primary: Arc<dyn InventoryRepository>, demo: &DemoData) -> Self {
        Self {
            primary,
            stock: demo.stock(),
        }
    }
}

#[async_trait]
impl InventoryRepository for FallbackInventory {
    async fn stock(
        &self,
        store_id: Option<StoreId>,
    ) -> Result<Vec<StockRecord>, InventoryRepositoryError> {
        let mock: Vec<StockRecord> = self
            .stock
            .iter()
            .filter(|record| store_id.is_none_or(|id| record.store_id == id))
            .cloned()
            .collect();
        Ok(or_mock("inventory", self.primary.stock(store_id).await, &mock))
    }

    async fn adjust(
        &self,
        store_id: StoreId,
        item_id: ItemId,
        delta: i64,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<i64, InventoryRepositoryError> {
        self.primary.adjust(store_id, item_id, delta, at).await
    }

    async fn transfer(&self, transfer: &Transfer) -> Result<(), InventoryRepositoryError> {
        self.primary.transfer(transfer).await
    }

    async fn next_transfer_id(&self) -> Result<TransferId, InventoryRepositoryError> {
        self.primary.next_transfer_id().await
    }

    async fn transfers(&self) -> Result<Vec<Transfer>, InventoryRepositoryError> {
        self.primary.transfers().await
    }
}

/// Promotions whose listing falls back to the generated campaigns.
pub struct FallbackPromotions {
    primary: Arc<dyn PromotionRepository>,
    promotions: Vec<Promotion>,
}

impl FallbackPromotions {
    pub fn new(primary: Arc<dyn PromotionRepository>, demo: &DemoData) -> Self {
        Self {
            primary,
            promotions: demo.promotions.clone(),
        }
    }
}

#[async_trait]
impl PromotionRepository for FallbackPromotions {
    async fn next_id(&self) -> Result<PromotionId, PromotionRepositoryError> {
        self.primary.next_id().await
    }

    async fn save(&self, promotion: &Promotion) -> Result<(), PromotionRepositoryError> {
        self.primary.save(promotion).await
    }

    async fn find(&self, id: PromotionId) -> Result<Option<Promotion>, PromotionRepositoryError> {
        match self.primary.find(id).await {
            Ok(found) => Ok(found),
            Err(err) => {
                warn!(port = "promotions", error = %err, "primary source failed; serving mock data");
                Ok(self.promotions.iter().find(|p| p.id == id).cloned())
            }
        }
    }

    async fn list(&self) -> Result<Vec<Promotion>, PromotionRepositoryError> {
        Ok(or_mock("promotions", self.primary.list().await, &self.promotions))
    }
}
