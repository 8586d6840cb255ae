//! Domain-typed view of the generated demo dataset.
//!
//! Both the in-memory repositories and the fallback decorators start from
//! the same [`DemoData`], so a fallback answer is indistinguishable from a
//! freshly seeded store.

use chrono::{DateTime, NaiveDate, Utc};
use mock_data::{
    DailySalesSeed, DatasetOptions, DiscountKindSeed, GenerationError, ItemSeed, MockDataset,
    PromotionSeed, StaffSeed, StoreSeed, generate_dataset,
};
use tracing::warn;

use crate::domain::inventory::{StockRecord, stock_from_history};
use crate::domain::{
    CatalogueItem, DailySales, DiscountType, Promotion, PromotionId, PromotionStatus, Role,
    StaffId, StaffMember, Store, StoreScope, round2,
};

/// Days of sales history generated for the demo dataset.
pub const DEMO_HISTORY_DAYS: u32 = 90;

/// Everything the in-memory adapters are seeded with.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoData {
    pub stores: Vec<Store>,
    pub items: Vec<CatalogueItem>,
    pub staff: Vec<StaffMember>,
    pub sales: Vec<DailySales>,
    pub promotions: Vec<Promotion>,
    /// Raw history rows, kept for the live sale ticker.
    pub sales_seeds: Vec<DailySalesSeed>,
    /// Last day of generated history.
    pub today: NaiveDate,
}

impl DemoData {
    /// Generate the dataset for `seed`, ending on `today`.
    pub fn generate(seed: u64, today: NaiveDate, now: DateTime<Utc>) -> Result<Self, GenerationError> {
        let options = DatasetOptions::new(seed, today).with_history_days(DEMO_HISTORY_DAYS);
        Ok(Self::from_dataset(generate_dataset(&options)?, today, now))
    }

    fn from_dataset(dataset: MockDataset, today: NaiveDate, now: DateTime<Utc>) -> Self {
        let MockDataset {
            stores,
            items,
            staff,
            sales,
            promotions,
        } = dataset;
        Self {
            stores: stores.iter().map(store_from).collect(),
            items: items.into_iter().map(item_from).collect(),
            staff: staff.into_iter().filter_map(staff_from).collect(),
            sales: sales.iter().map(daily_from).collect(),
            promotions: promotions
                .into_iter()
                .zip(1..)
                .map(|(seed, id)| promotion_from(seed, PromotionId(id), now))
                .collect(),
            sales_seeds: sales,
            today,
        }
    }

    /// Stock levels implied by the last 30 days of generated sales.
    pub fn stock(&self) -> Vec<StockRecord> {
        stock_from_history(&self.sales, self.today)
    }

    pub fn store_ids(&self) -> Vec<u32> {
        self.stores.iter().map(|store| store.id).collect()
    }

    pub fn item_ids(&self) -> Vec<u32> {
        self.items.iter().map(|item| item.id).collect()
    }
}

fn store_from(seed: &StoreSeed) -> Store {
    Store {
        id: seed.id,
        name: seed.name.to_owned(),
        city: seed.city.to_owned(),
        region_id: seed.region_id,
    }
}

fn item_from(seed: ItemSeed) -> CatalogueItem {
    CatalogueItem {
        id: seed.id,
        name: seed.name,
        category: seed.category,
        unit_cost: seed.unit_cost,
        unit_price: seed.unit_price,
    }
}

fn staff_from(seed: StaffSeed) -> Option<StaffMember> {
    let role = match seed.role.parse::<Role>() {
        Ok(role) => role,
        Err(err) => {
            warn!(email = %seed.email, error = %err, "skipping generated staff member");
            return None;
        }
    };
    Some(StaffMember {
        id: StaffId::from_uuid(seed.id),
        email: seed.email.to_lowercase(),
        first_name: seed.first_name,
        last_name: seed.last_name,
        role,
        job_title: seed.job_title.to_owned(),
        scope: StoreScope::from_parts(seed.all_stores, seed.store_ids),
    })
}

fn daily_from(seed: &DailySalesSeed) -> DailySales {
    DailySales {
        date: seed.date,
        store_id: seed.store_id,
        item_id: seed.item_id,
        units: u64::from(seed.units),
        revenue: seed.revenue,
    }
}

fn promotion_from(seed: PromotionSeed, id: PromotionId, now: DateTime<Utc>) -> Promotion {
    let discount_type = match seed.discount_kind {
        DiscountKindSeed::Percentage => DiscountType::Percentage,
        DiscountKindSeed::Fixed => DiscountType::Fixed,
        DiscountKindSeed::Bogo => DiscountType::Bogo,
    };
    let redemptions = u64::from(seed.redemptions);
    let per_redemption = match discount_type {
        DiscountType::Fixed => seed.discount_value,
        DiscountType::Percentage | DiscountType::Bogo => seed.discount_value / 10.0,
    };
    Promotion {
        id,
        description: format!("{} across {} stores", seed.name, seed.store_ids.len()),
        name: seed.name,
        discount_type,
        discount_value: seed.discount_value,
        start_date: seed.start_date,
        end_date: seed.end_date,
        min_purchase: None,
        max_discount: None,
        store_ids: seed.store_ids,
        item_ids: Vec::new(),
        category: Some(seed.category),
        // Dated statuses are derived on read.
        status: PromotionStatus::Scheduled,
        redemptions,
        discount_given: round2(redemptions as f64 * per_redemption),
        created_by: "system".to_owned(),
        created_at: now,
        updated_at: now,
    }
}
