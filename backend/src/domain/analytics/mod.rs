//! Read-only analytics over the sales history.
//!
//! Everything here is derived from [`DailySales`] rows and the live sale
//! buffer: headline KPIs, chart series for the executive dashboard, raw
//! history browsing, period reports, per-pair forecasts and stock movement.
//! Figures are restricted to the caller's store scope.

mod forecast;
mod service;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use self::forecast::{extend_trend, predict_pair};
pub use self::service::AnalyticsService;

use super::catalogue::{CatalogueItem, Store, round2};
use super::inventory::CategoryInventory;
use super::sales::{DailySales, SalesTrend};
use super::staff::{ItemId, StoreId};

/// Headline counters for the dashboard header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Kpis {
    pub total_historical_records: usize,
    pub total_streaming_records: usize,
    pub total_sales_today: u64,
    pub total_sales_week: u64,
    pub total_sales_month: u64,
    /// Mean units per store/item/day row.
    pub average_daily_sales: f64,
    pub unique_stores: usize,
    pub unique_items: usize,
    pub data_range_start: Option<NaiveDate>,
    pub data_range_end: Option<NaiveDate>,
    pub last_stream_timestamp: Option<DateTime<Utc>>,
    pub sales_trend: SalesTrend,
}

/// A day of the chart series. Recorded days carry `sales`, projected days
/// carry `forecast`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub sales: Option<u64>,
    pub forecast: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesForecast {
    pub data: Vec<ForecastPoint>,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreShare {
    pub store_id: StoreId,
    pub store_name: String,
    pub total_sales: u64,
    /// Share of all units, in percent with two decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreDistribution {
    pub data: Vec<StoreShare>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemSales {
    pub item_id: ItemId,
    pub item_name: String,
    pub category: String,
    pub total_sales: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TopItems {
    pub data: Vec<ItemSales>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryShare {
    pub category: String,
    pub total_sales: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryBreakdown {
    pub data: Vec<CategoryShare>,
    pub total: u64,
}

/// One live sale with the running total of every live sale before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StreamingPoint {
    pub timestamp: DateTime<Utc>,
    pub store_name: String,
    pub item_name: String,
    pub sales: u32,
    pub cumulative: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StreamingTrend {
    pub data: Vec<StreamingPoint>,
    pub total_streaming: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyUnits {
    pub date: NaiveDate,
    pub sales: u64,
}

/// Every executive chart in one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsSummary {
    pub sales_trend: Vec<DailyUnits>,
    pub store_distribution: Vec<StoreShare>,
    pub top_items: Vec<ItemSales>,
    pub category_breakdown: Vec<CategoryShare>,
}

/// Filters for browsing raw history, newest day first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub store_id: Option<StoreId>,
    pub item_id: Option<ItemId>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoricalSale {
    pub date: NaiveDate,
    pub store_id: StoreId,
    pub item_id: ItemId,
    pub sales: u64,
    pub revenue: f64,
}

impl From<DailySales> for HistoricalSale {
    fn from(row: DailySales) -> Self {
        Self {
            date: row.date,
            store_id: row.store_id,
            item_id: row.item_id,
            sales: row.units,
            revenue: row.revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryPage {
    pub data: Vec<HistoricalSale>,
    pub total: usize,
    /// 1-based page implied by `offset / limit`.
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryRange {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryStores {
    pub stores: Vec<Store>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryItems {
    pub items: Vec<CatalogueItem>,
}

/// A projected day for one store/item pair with its 95% band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Prediction {
    pub prediction_date: NaiveDate,
    pub predicted_sales: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportPeriod {
    pub days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportKpis {
    pub total_sales: u64,
    /// History rows in the period.
    pub total_transactions: usize,
    pub avg_basket_size: f64,
    /// Percent change against the preceding period of equal length.
    pub sales_growth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyReportRow {
    pub date: NaiveDate,
    pub sales: u64,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryReportRow {
    pub category: String,
    pub sales: u64,
    pub transactions: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreReportRow {
    pub store_id: StoreId,
    pub store_name: String,
    pub city: String,
    pub sales: u64,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesReport {
    pub period: ReportPeriod,
    pub kpis: ReportKpis,
    pub daily_sales: Vec<DailyReportRow>,
    pub category_breakdown: Vec<CategoryReportRow>,
    pub store_performance: Vec<StoreReportRow>,
    pub top_items: Vec<ItemSales>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventoryReport {
    pub categories: Vec<CategoryInventory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StorePerformance {
    pub store_id: StoreId,
    pub store_name: String,
    pub city: String,
    pub current_sales: u64,
    pub previous_sales: u64,
    /// Percent, one decimal; zero when the previous period sold nothing.
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerformanceReport {
    pub period_days: u32,
    pub stores: Vec<StorePerformance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MovementDay {
    pub date: NaiveDate,
    /// Distinct items with sales that day.
    pub items_sold: usize,
    pub total_units: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryMovement {
    pub category: String,
    pub total_units: u64,
    pub item_count: usize,
}

/// Stock leaving the shelves, per day and per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventoryMovement {
    pub period_days: u32,
    pub daily_trend: Vec<MovementDay>,
    pub top_categories: Vec<CategoryMovement>,
    pub total_movement: u64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part` as a percentage of `whole`; zero when `whole` is zero.
fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Percent change from `previous` to `current`, one decimal.
pub(crate) fn growth(previous: u64, current: u64) -> f64 {
    if previous == 0 {
        0.0
    } else {
        round1((current as f64 - previous as f64) / previous as f64 * 100.0)
    }
}

/// Units per calendar day, oldest first.
fn units_by_day(rows: &[DailySales]) -> BTreeMap<NaiveDate, u64> {
    let mut by_day = BTreeMap::new();
    for row in rows {
        *by_day.entry(row.date).or_default() += row.units;
    }
    by_day
}

/// Units per store, largest first, joined with store names.
fn store_shares(rows: &[DailySales], stores: &[Store]) -> (Vec<StoreShare>, u64) {
    let names: HashMap<StoreId, &str> = stores
        .iter()
        .map(|store| (store.id, store.name.as_str()))
        .collect();
    let mut per_store: HashMap<StoreId, u64> = HashMap::new();
    for row in rows {
        *per_store.entry(row.store_id).or_default() += row.units;
    }
    let total = per_store.values().sum();
    let mut shares: Vec<StoreShare> = per_store
        .into_iter()
        .map(|(store_id, units)| StoreShare {
            store_id,
            store_name: names
                .get(&store_id)
                .map_or_else(|| format!("Store {store_id}"), |name| (*name).to_owned()),
            total_sales: units,
            percentage: round2(percent_of(units, total)),
        })
        .collect();
    shares.sort_by(|a, b| {
        b.total_sales
            .cmp(&a.total_sales)
            .then(a.store_id.cmp(&b.store_id))
    });
    (shares, total)
}

/// The `limit` best-selling items, ties broken by id.
fn top_items(
    rows: &[DailySales],
    items: &HashMap<ItemId, CatalogueItem>,
    limit: usize,
) -> Vec<ItemSales> {
    let mut per_item: HashMap<ItemId, u64> = HashMap::new();
    for row in rows {
        *per_item.entry(row.item_id).or_default() += row.units;
    }
    let mut ranked: Vec<ItemSales> = per_item
        .into_iter()
        .map(|(item_id, units)| {
            let (item_name, category) = items.get(&item_id).map_or_else(
                || (format!("Item {item_id}"), String::from("Uncategorised")),
                |item| (item.name.clone(), item.category.clone()),
            );
            ItemSales {
                item_id,
                item_name,
                category,
                total_sales: units,
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total_sales
            .cmp(&a.total_sales)
            .then(a.item_id.cmp(&b.item_id))
    });
    ranked.truncate(limit);
    ranked
}

#[derive(Default)]
struct CategoryTally {
    units: u64,
    rows: usize,
    items: BTreeSet<ItemId>,
}

/// Units, row count and distinct items per category, largest first.
fn category_tallies(
    rows: &[DailySales],
    items: &HashMap<ItemId, CatalogueItem>,
) -> Vec<(String, CategoryTally)> {
    let mut per_category: HashMap<String, CategoryTally> = HashMap::new();
    for row in rows {
        let category = items
            .get(&row.item_id)
            .map_or("Uncategorised", |item| item.category.as_str());
        let tally = per_category.entry(category.to_owned()).or_default();
        tally.units += row.units;
        tally.rows += 1;
        tally.items.insert(row.item_id);
    }
    let mut tallies: Vec<_> = per_category.into_iter().collect();
    tallies.sort_by(|a, b| b.1.units.cmp(&a.1.units).then(a.0.cmp(&b.0)));
    tallies
}

fn category_shares(
    rows: &[DailySales],
    items: &HashMap<ItemId, CatalogueItem>,
) -> (Vec<CategoryShare>, u64) {
    let tallies = category_tallies(rows, items);
    let total = tallies.iter().map(|(_, tally)| tally.units).sum();
    let shares = tallies
        .into_iter()
        .map(|(category, tally)| CategoryShare {
            category,
            total_sales: tally.units,
            percentage: round2(percent_of(tally.units, total)),
        })
        .collect();
    (shares, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{item, store};
    use rstest::rstest;

    fn day(date: &str, store_id: StoreId, item_id: ItemId, units: u64) -> DailySales {
        DailySales {
            date: date.parse().expect("date"),
            store_id,
            item_id,
            units,
            revenue: units as f64 * 2.0,
        }
    }

    fn catalogue() -> HashMap<ItemId, CatalogueItem> {
        [item(1, "Dairy"), item(2, "Dairy"), item(3, "Bakery")]
            .into_iter()
            .map(|item| (item.id, item))
            .collect()
    }

    #[rstest]
    #[case(0, 40, 0.0)]
    #[case(100, 150, 50.0)]
    #[case(300, 200, -33.3)]
    fn growth_is_relative_to_the_previous_period(
        #[case] previous: u64,
        #[case] current: u64,
        #[case] expected: f64,
    ) {
        assert_eq!(growth(previous, current), expected);
    }

    #[rstest]
    fn store_shares_sum_to_the_whole() {
        let rows = vec![
            day("2026-03-01", 1, 1, 30),
            day("2026-03-02", 1, 2, 30),
            day("2026-03-02", 2, 1, 40),
        ];
        let (shares, total) = store_shares(&rows, &[store(1), store(2)]);
        assert_eq!(total, 100);
        assert_eq!(shares[0].store_id, 1);
        assert_eq!(shares[0].percentage, 60.0);
        assert_eq!(shares[1].store_name, "Store 2");
    }

    #[rstest]
    fn top_items_rank_by_units_then_id() {
        let rows = vec![
            day("2026-03-01", 1, 3, 10),
            day("2026-03-01", 1, 2, 10),
            day("2026-03-01", 1, 1, 5),
        ];
        let ranked = top_items(&rows, &catalogue(), 2);
        let ids: Vec<_> = ranked.iter().map(|item| item.item_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(ranked[1].category, "Bakery");
    }

    #[rstest]
    fn categories_count_distinct_items() {
        let rows = vec![
            day("2026-03-01", 1, 1, 10),
            day("2026-03-02", 1, 1, 10),
            day("2026-03-02", 1, 2, 5),
            day("2026-03-02", 1, 3, 75),
        ];
        let tallies = category_tallies(&rows, &catalogue());
        assert_eq!(tallies[0].0, "Bakery");
        let dairy = &tallies[1].1;
        assert_eq!((dairy.units, dairy.rows, dairy.items.len()), (25, 3, 2));
        let (shares, total) = category_shares(&rows, &catalogue());
        assert_eq!(total, 100);
        assert_eq!(shares[1].percentage, 25.0);
    }

    #[rstest]
    fn empty_history_has_no_shares() {
        let (shares, total) = category_shares(&[], &catalogue());
        assert!(shares.is_empty());
        assert_eq!(total, 0);
        assert_eq!(percent_of(5, 0), 0.0);
    }
}
