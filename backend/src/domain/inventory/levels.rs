//! Stock levels derived from sales velocity.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::sales::DailySales;
use crate::domain::staff::{ItemId, StoreId};

use super::StockRecord;

/// Days of history, counted back from the anchor date, the initial levels
/// are derived from.
pub const VELOCITY_WINDOW_DAYS: u32 = 30;

/// Stock position of an item at a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
    Overstocked,
}

impl StockStatus {
    /// Classify a quantity against its thresholds.
    pub fn classify(quantity: i64, reorder_level: i64, max_stock: i64) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= reorder_level {
            StockStatus::LowStock
        } else if quantity > max_stock {
            StockStatus::Overstocked
        } else {
            StockStatus::InStock
        }
    }

    /// Sort rank: out of stock first, then low, then the rest.
    pub fn urgency(self) -> u8 {
        match self {
            StockStatus::OutOfStock => 0,
            StockStatus::LowStock => 1,
            StockStatus::InStock | StockStatus::Overstocked => 2,
        }
    }
}

/// Quantity and thresholds for one item at one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevels {
    pub quantity: i64,
    pub reorder_level: i64,
    pub max_stock: i64,
}

/// Levels implied by `units_sold` over the window at `avg_daily` units a day.
///
/// Fast movers hold more stock and reorder earlier.
pub fn levels_from_velocity(units_sold: u64, avg_daily: f64) -> StockLevels {
    let sold = i64::try_from(units_sold).unwrap_or(i64::MAX);
    let (base, divisor, reorder_level, max_stock) = if avg_daily > 50.0 {
        (500, 10, 100, 600)
    } else if avg_daily > 20.0 {
        (300, 15, 50, 400)
    } else {
        (200, 20, 25, 250)
    };
    StockLevels {
        quantity: (base - sold / divisor).max(0),
        reorder_level,
        max_stock,
    }
}

/// Derive one stock record per store/item pair sold in the
/// [`VELOCITY_WINDOW_DAYS`] up to and including `as_of`.
///
/// The daily average is taken over the trading days recorded for the pair
/// inside the window. Older and later rows are ignored.
pub fn stock_from_history(history: &[DailySales], as_of: NaiveDate) -> Vec<StockRecord> {
    let since = as_of
        .checked_sub_days(Days::new(u64::from(VELOCITY_WINDOW_DAYS)))
        .unwrap_or(NaiveDate::MIN);
    let mut sold: BTreeMap<(StoreId, ItemId), (u64, u32)> = BTreeMap::new();
    for day in history
        .iter()
        .filter(|day| day.date >= since && day.date <= as_of)
    {
        let (units, days) = sold.entry((day.store_id, day.item_id)).or_default();
        *units += day.units;
        *days += 1;
    }
    sold.into_iter()
        .map(|((store_id, item_id), (units, days))| {
            let avg_daily = units as f64 / f64::from(days.max(1));
            let levels = levels_from_velocity(units, avg_daily);
            StockRecord {
                store_id,
                item_id,
                quantity: levels.quantity,
                reorder_level: levels.reorder_level,
                max_stock: levels.max_stock,
                last_restocked: None,
            }
        })
        .collect()
}
