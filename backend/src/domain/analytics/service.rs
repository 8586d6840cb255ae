//! Analytics queries over the sales history ports.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use mockable::Clock;
use serde_json::json;
use tracing::debug;

use super::forecast::{extend_trend, predict_pair};
use super::{
    AnalyticsSummary, CategoryBreakdown, CategoryMovement, CategoryReportRow, DailyReportRow,
    DailyUnits, ForecastPoint, HistoricalSale, HistoryItems, HistoryPage, HistoryQuery,
    HistoryRange, HistoryStores, InventoryMovement, Kpis, MovementDay, PerformanceReport,
    Prediction, ReportKpis, ReportPeriod, SalesForecast, SalesReport, StoreDistribution,
    StorePerformance, StoreReportRow, StreamingPoint, StreamingTrend, TopItems, category_shares,
    category_tallies, growth, percent_of, round1, store_shares, top_items, units_by_day,
};
use crate::domain::Error;
use crate::domain::catalogue::{CatalogueItem, Store, round2};
use crate::domain::ports::{SalesHistory, SalesHistoryError, StoreCatalogue, StoreCatalogueError};
use crate::domain::read_model::ReadModels;
use crate::domain::sales::{DailySales, SalesTrend, bounded};
use crate::domain::staff::{ItemId, StaffMember, StoreId};

const DEFAULT_CHART_DAYS: u32 = 30;
const MAX_CHART_DAYS: u32 = 365;
const DEFAULT_TOP_ITEMS: u32 = 10;
const MIN_TOP_ITEMS: u32 = 5;
const MAX_TOP_ITEMS: u32 = 50;
const DEFAULT_HISTORY_LIMIT: u32 = 100;
const MAX_HISTORY_LIMIT: u32 = 1000;
const DEFAULT_PREDICTION_DAYS: u32 = 30;
const MAX_PREDICTION_DAYS: u32 = 90;
const DEFAULT_SALES_REPORT_DAYS: u32 = 7;
const DEFAULT_PERFORMANCE_DAYS: u32 = 30;
const REPORT_TOP_ITEMS: usize = 20;
const MOVEMENT_CATEGORIES: usize = 10;

fn map_history_error(err: SalesHistoryError) -> Error {
    match err {
        SalesHistoryError::Unavailable { message } => {
            Error::service_unavailable(format!("sales history unavailable: {message}"))
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

fn ensure_in_scope(actor: &StaffMember, store_id: Option<StoreId>) -> Result<(), Error> {
    match store_id.filter(|id| !actor.scope.contains(*id)) {
        Some(id) => Err(Error::forbidden(format!("store {id} is outside your scope"))),
        None => Ok(()),
    }
}

fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Sales analytics, history browsing, reports and forecasts.
#[derive(Clone)]
pub struct AnalyticsService {
    history: Arc<dyn SalesHistory>,
    catalogue: Arc<dyn StoreCatalogue>,
    read_models: ReadModels,
    clock: Arc<dyn Clock>,
}

impl AnalyticsService {
    pub fn new(
        history: Arc<dyn SalesHistory>,
        catalogue: Arc<dyn StoreCatalogue>,
        read_models: ReadModels,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            history,
            catalogue,
            read_models,
            clock,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    /// History rows from `since` onwards inside the caller's scope.
    async fn visible_rows(
        &self,
        actor: &StaffMember,
        since: NaiveDate,
    ) -> Result<Vec<DailySales>, Error> {
        let rows = self.history.daily(since).await.map_err(map_history_error)?;
        Ok(actor.scope.filter(rows, |row| row.store_id))
    }

    async fn items_by_id(&self) -> Result<HashMap<ItemId, CatalogueItem>, Error> {
        Ok(self
            .catalogue
            .items()
            .await
            .map_err(map_catalogue_error)?
            .into_iter()
            .map(|item| (item.id, item))
            .collect())
    }

    async fn stores(&self) -> Result<Vec<Store>, Error> {
        self.catalogue.stores().await.map_err(map_catalogue_error)
    }

    /// Record counts, period totals, coverage and the weekly trend.
    pub async fn kpis(&self, actor: &StaffMember) -> Result<Kpis, Error> {
        let today = self.today();
        let week_ago = days_before(today, 7);
        let fortnight_ago = days_before(today, 14);
        let month_ago = days_before(today, 30);
        let rows = self.visible_rows(actor, NaiveDate::MIN).await?;
        let live = self
            .history
            .latest(usize::MAX)
            .await
            .map_err(map_history_error)?;
        let live = actor.scope.filter(live, |sale| sale.store_id);
        let units_where = |pred: &dyn Fn(NaiveDate) -> bool| -> u64 {
            rows.iter().filter(|r| pred(r.date)).map(|r| r.units).sum()
        };
        let last_week = units_where(&|d| d >= week_ago && d < today);
        let previous_week = units_where(&|d| d >= fortnight_ago && d < week_ago);
        let total_units: u64 = rows.iter().map(|row| row.units).sum();
        let average_daily_sales = if rows.is_empty() {
            0.0
        } else {
            round2(total_units as f64 / rows.len() as f64)
        };
        Ok(Kpis {
            total_historical_records: rows.len(),
            total_streaming_records: live.len(),
            total_sales_today: units_where(&|d| d == today),
            total_sales_week: units_where(&|d| d >= week_ago),
            total_sales_month: units_where(&|d| d >= month_ago),
            average_daily_sales,
            unique_stores: rows
                .iter()
                .map(|row| row.store_id)
                .collect::<BTreeSet<_>>()
                .len(),
            unique_items: rows
                .iter()
                .map(|row| row.item_id)
                .collect::<BTreeSet<_>>()
                .len(),
            data_range_start: rows.iter().map(|row| row.date).min(),
            data_range_end: rows.iter().map(|row| row.date).max(),
            last_stream_timestamp: live.iter().map(|sale| sale.recorded_at).max(),
            sales_trend: SalesTrend::between(previous_week, last_week),
        })
    }

    /// The last `days` recorded days, optionally followed by a week of
    /// projections.
    pub async fn sales_forecast(
        &self,
        actor: &StaffMember,
        days: Option<u32>,
        include_forecast: bool,
    ) -> Result<SalesForecast, Error> {
        let days = bounded(days, DEFAULT_CHART_DAYS, 7, MAX_CHART_DAYS, "days")?;
        let params = json!({
            "days": days,
            "forecast": include_forecast,
            "scope": actor.scope,
            "today": self.today(),
        });
        self.read_models
            .get_or_compute("analytics-trend", &params, || async {
                let rows = self.visible_rows(actor, NaiveDate::MIN).await?;
                let recorded = recorded_days(&rows, days as usize);
                let data = if include_forecast {
                    extend_trend(&recorded)
                } else {
                    recorded
                        .iter()
                        .map(|day| ForecastPoint {
                            date: day.date,
                            sales: Some(day.sales),
                            forecast: None,
                        })
                        .collect()
                };
                Ok(SalesForecast { data, days })
            })
            .await
    }

    /// Units per store over the whole history.
    pub async fn store_distribution(
        &self,
        actor: &StaffMember,
    ) -> Result<StoreDistribution, Error> {
        let rows = self.visible_rows(actor, NaiveDate::MIN).await?;
        let (data, total) = store_shares(&rows, &self.stores().await?);
        Ok(StoreDistribution { data, total })
    }

    /// Best sellers over the whole history.
    pub async fn top_items(
        &self,
        actor: &StaffMember,
        limit: Option<u32>,
    ) -> Result<TopItems, Error> {
        let limit = bounded(limit, DEFAULT_TOP_ITEMS, MIN_TOP_ITEMS, MAX_TOP_ITEMS, "limit")?;
        let rows = self.visible_rows(actor, NaiveDate::MIN).await?;
        Ok(TopItems {
            data: top_items(&rows, &self.items_by_id().await?, limit as usize),
        })
    }

    pub async fn categories(&self, actor: &StaffMember) -> Result<CategoryBreakdown, Error> {
        let rows = self.visible_rows(actor, NaiveDate::MIN).await?;
        let (data, total) = category_shares(&rows, &self.items_by_id().await?);
        Ok(CategoryBreakdown { data, total })
    }

    /// Buffered live sales, oldest first, with a running total.
    pub async fn streaming_trend(&self, actor: &StaffMember) -> Result<StreamingTrend, Error> {
        let live = self
            .history
            .latest(usize::MAX)
            .await
            .map_err(map_history_error)?;
        let mut cumulative = 0;
        let data: Vec<StreamingPoint> = actor
            .scope
            .filter(live, |sale| sale.store_id)
            .into_iter()
            .rev()
            .map(|sale| {
                cumulative += u64::from(sale.units);
                StreamingPoint {
                    timestamp: sale.recorded_at,
                    store_name: sale.store_name,
                    item_name: sale.item_name,
                    sales: sale.units,
                    cumulative,
                }
            })
            .collect();
        Ok(StreamingTrend {
            data,
            total_streaming: cumulative,
        })
    }

    /// Trend, store split, top ten items and categories in one read.
    pub async fn summary(&self, actor: &StaffMember) -> Result<AnalyticsSummary, Error> {
        let params = json!({ "scope": actor.scope, "today": self.today() });
        self.read_models
            .get_or_compute("analytics-summary", &params, || async {
                let rows = self.visible_rows(actor, NaiveDate::MIN).await?;
                let items = self.items_by_id().await?;
                Ok(AnalyticsSummary {
                    sales_trend: recorded_days(&rows, DEFAULT_CHART_DAYS as usize),
                    store_distribution: store_shares(&rows, &self.stores().await?).0,
                    top_items: top_items(&rows, &items, DEFAULT_TOP_ITEMS as usize),
                    category_breakdown: category_shares(&rows, &items).0,
                })
            })
            .await
    }

    /// Raw history rows, newest day first.
    pub async fn history(
        &self,
        actor: &StaffMember,
        query: &HistoryQuery,
    ) -> Result<HistoryPage, Error> {
        let limit = bounded(
            query.limit,
            DEFAULT_HISTORY_LIMIT,
            1,
            MAX_HISTORY_LIMIT,
            "limit",
        )?;
        ensure_in_scope(actor, query.store_id)?;
        if query.from.zip(query.to).is_some_and(|(from, to)| from > to) {
            return Err(Error::invalid_request("from must not be after to")
                .with_details(json!({ "field": "from", "code": "after_to" })));
        }
        let offset = query.offset.unwrap_or(0);
        let mut rows: Vec<DailySales> = self
            .visible_rows(actor, query.from.unwrap_or(NaiveDate::MIN))
            .await?
            .into_iter()
            .filter(|row| query.to.is_none_or(|to| row.date <= to))
            .filter(|row| query.store_id.is_none_or(|id| row.store_id == id))
            .filter(|row| query.item_id.is_none_or(|id| row.item_id == id))
            .collect();
        rows.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(a.store_id.cmp(&b.store_id))
                .then(a.item_id.cmp(&b.item_id))
        });
        let total = rows.len();
        let data = rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(HistoricalSale::from)
            .collect();
        Ok(HistoryPage {
            data,
            total,
            page: offset / limit + 1,
            limit,
        })
    }

    /// First and last recorded day and the number of rows.
    pub async fn history_range(&self, actor: &StaffMember) -> Result<HistoryRange, Error> {
        let rows = self.visible_rows(actor, NaiveDate::MIN).await?;
        Ok(HistoryRange {
            min_date: rows.iter().map(|row| row.date).min(),
            max_date: rows.iter().map(|row| row.date).max(),
            total_records: rows.len(),
        })
    }

    /// Stores the caller may filter history by.
    pub async fn history_stores(&self, actor: &StaffMember) -> Result<HistoryStores, Error> {
        let stores = actor.scope.filter(self.stores().await?, |store| store.id);
        Ok(HistoryStores { stores })
    }

    pub async fn history_items(&self) -> Result<HistoryItems, Error> {
        let mut items = self.catalogue.items().await.map_err(map_catalogue_error)?;
        items.sort_by_key(|item| item.id);
        Ok(HistoryItems { items })
    }

    /// Forecast `days` days of one item at one store.
    ///
    /// # Errors
    /// Not found when the pair has fewer than a week of history.
    pub async fn predictions(
        &self,
        actor: &StaffMember,
        store_id: StoreId,
        item_id: ItemId,
        days: Option<u32>,
    ) -> Result<Vec<Prediction>, Error> {
        let days = bounded(days, DEFAULT_PREDICTION_DAYS, 1, MAX_PREDICTION_DAYS, "days")?;
        ensure_in_scope(actor, Some(store_id))?;
        let mut series: Vec<DailySales> = self
            .history
            .daily(NaiveDate::MIN)
            .await
            .map_err(map_history_error)?
            .into_iter()
            .filter(|row| row.store_id == store_id && row.item_id == item_id)
            .collect();
        series.sort_by_key(|row| row.date);
        let predictions = predict_pair(&series, days);
        if predictions.is_empty() {
            debug!(store_id, item_id, rows = series.len(), "too little history to forecast");
            return Err(Error::not_found("not enough historical data for predictions"));
        }
        Ok(predictions)
    }

    /// Totals, daily series, category and store splits for the last `days`
    /// days, compared with the `days` before them.
    pub async fn sales_report(
        &self,
        actor: &StaffMember,
        days: Option<u32>,
        store_id: Option<StoreId>,
    ) -> Result<SalesReport, Error> {
        let days = bounded(days, DEFAULT_SALES_REPORT_DAYS, 1, MAX_CHART_DAYS, "days")?;
        ensure_in_scope(actor, store_id)?;
        let today = self.today();
        let params = json!({
            "days": days,
            "store_id": store_id,
            "scope": actor.scope,
            "today": today,
        });
        self.read_models
            .get_or_compute("reports-sales", &params, || async {
                let start = days_before(today, days);
                let previous_start = days_before(start, days);
                let rows: Vec<DailySales> = self
                    .visible_rows(actor, previous_start)
                    .await?
                    .into_iter()
                    .filter(|row| store_id.is_none_or(|id| row.store_id == id))
                    .collect();
                let (current, previous): (Vec<_>, Vec<_>) =
                    rows.into_iter().partition(|row| row.date >= start);
                let items = self.items_by_id().await?;
                let total_sales: u64 = current.iter().map(|row| row.units).sum();
                let previous_sales: u64 = previous.iter().map(|row| row.units).sum();
                let avg_basket_size = if current.is_empty() {
                    0.0
                } else {
                    round2(total_sales as f64 / current.len() as f64)
                };
                Ok(SalesReport {
                    period: ReportPeriod {
                        days,
                        start_date: start,
                        end_date: today,
                    },
                    kpis: ReportKpis {
                        total_sales,
                        total_transactions: current.len(),
                        avg_basket_size,
                        sales_growth: growth(previous_sales, total_sales),
                    },
                    daily_sales: daily_report(&current),
                    category_breakdown: category_tallies(&current, &items)
                        .into_iter()
                        .map(|(category, tally)| CategoryReportRow {
                            category,
                            sales: tally.units,
                            transactions: tally.rows,
                            percentage: round1(percent_of(tally.units, total_sales)),
                        })
                        .collect(),
                    store_performance: store_report(&current, &self.stores().await?),
                    top_items: top_items(&current, &items, REPORT_TOP_ITEMS),
                })
            })
            .await
    }

    /// Per-store units for the last `days` days against the `days` before.
    pub async fn performance_report(
        &self,
        actor: &StaffMember,
        days: Option<u32>,
    ) -> Result<PerformanceReport, Error> {
        let days = bounded(days, DEFAULT_PERFORMANCE_DAYS, 1, MAX_CHART_DAYS, "days")?;
        let today = self.today();
        let params = json!({ "days": days, "scope": actor.scope, "today": today });
        self.read_models
            .get_or_compute("reports-performance", &params, || async {
                let start = days_before(today, days);
                let rows = self.visible_rows(actor, days_before(start, days)).await?;
                let mut per_store: HashMap<StoreId, (u64, u64)> = HashMap::new();
                for row in &rows {
                    let entry = per_store.entry(row.store_id).or_default();
                    if row.date >= start {
                        entry.0 += row.units;
                    } else {
                        entry.1 += row.units;
                    }
                }
                let mut stores: Vec<StorePerformance> = self
                    .stores()
                    .await?
                    .into_iter()
                    .filter_map(|store| {
                        let (current, previous) = per_store.get(&store.id).copied()?;
                        // Stores idle in the current period are left out.
                        (current > 0).then(|| StorePerformance {
                            store_id: store.id,
                            store_name: store.name,
                            city: store.city,
                            current_sales: current,
                            previous_sales: previous,
                            growth_rate: growth(previous, current),
                        })
                    })
                    .collect();
                stores.sort_by(|a, b| {
                    b.current_sales
                        .cmp(&a.current_sales)
                        .then(a.store_id.cmp(&b.store_id))
                });
                Ok(PerformanceReport {
                    period_days: days,
                    stores,
                })
            })
            .await
    }

    /// Units leaving the shelves over the last `days` days.
    pub async fn inventory_movement(
        &self,
        actor: &StaffMember,
        days: Option<u32>,
    ) -> Result<InventoryMovement, Error> {
        let days = bounded(days, DEFAULT_CHART_DAYS, 7, 90, "days")?;
        let rows = self
            .visible_rows(actor, days_before(self.today(), days))
            .await?;
        let mut per_day: BTreeMap<NaiveDate, (BTreeSet<ItemId>, u64)> = BTreeMap::new();
        for row in &rows {
            let entry = per_day.entry(row.date).or_default();
            if row.units > 0 {
                entry.0.insert(row.item_id);
            }
            entry.1 += row.units;
        }
        let daily_trend: Vec<MovementDay> = per_day
            .into_iter()
            .map(|(date, (items, units))| MovementDay {
                date,
                items_sold: items.len(),
                total_units: units,
            })
            .collect();
        let mut top_categories: Vec<CategoryMovement> =
            category_tallies(&rows, &self.items_by_id().await?)
                .into_iter()
                .map(|(category, tally)| CategoryMovement {
                    category,
                    total_units: tally.units,
                    item_count: tally.items.len(),
                })
                .collect();
        top_categories.truncate(MOVEMENT_CATEGORIES);
        Ok(InventoryMovement {
            period_days: days,
            total_movement: daily_trend.iter().map(|day| day.total_units).sum(),
            daily_trend,
            top_categories,
        })
    }
}

/// The last `days` recorded days, oldest first.
fn recorded_days(rows: &[DailySales], days: usize) -> Vec<DailyUnits> {
    let by_day = units_by_day(rows);
    let skip = by_day.len().saturating_sub(days);
    by_day
        .into_iter()
        .skip(skip)
        .map(|(date, sales)| DailyUnits { date, sales })
        .collect()
}

fn daily_report(rows: &[DailySales]) -> Vec<DailyReportRow> {
    let mut per_day: BTreeMap<NaiveDate, (u64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = per_day.entry(row.date).or_default();
        entry.0 += row.units;
        entry.1 += 1;
    }
    per_day
        .into_iter()
        .map(|(date, (sales, transactions))| DailyReportRow {
            date,
            sales,
            transactions,
        })
        .collect()
}

fn store_report(rows: &[DailySales], stores: &[Store]) -> Vec<StoreReportRow> {
    let mut per_store: HashMap<StoreId, (u64, usize)> = HashMap::new();
    for row in rows {
        let entry = per_store.entry(row.store_id).or_default();
        entry.0 += row.units;
        entry.1 += 1;
    }
    let mut report: Vec<StoreReportRow> = stores
        .iter()
        .filter_map(|store| {
            let (sales, transactions) = per_store.get(&store.id).copied()?;
            Some(StoreReportRow {
                store_id: store.id,
                store_name: store.name.clone(),
                city: store.city.clone(),
                sales,
                transactions,
            })
        })
        .collect();
    report.sort_by(|a, b| b.sales.cmp(&a.sales).then(a.store_id.cmp(&b.store_id)));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockReadModelCache, MockSalesHistory, MockStoreCatalogue};
    use crate::domain::{Role, SaleEvent, SaleId};
    use crate::test_support::{FixtureClock, item, staff_in_stores, staff_with_role, store};
    use rstest::rstest;
    use std::time::Duration;

    fn date(text: &str) -> NaiveDate {
        text.parse().expect("date")
    }

    fn row(day: &str, store_id: StoreId, item_id: ItemId, units: u64) -> DailySales {
        DailySales {
            date: date(day),
            store_id,
            item_id,
            units,
            revenue: units as f64,
        }
    }

    fn live_sale(id: u64, store_id: StoreId, units: u32, minute: u32) -> SaleEvent {
        SaleEvent {
            id: SaleId(id),
            store_id,
            store_name: format!("Store {store_id}"),
            item_id: 1,
            item_name: "Item 1".to_owned(),
            units,
            revenue: f64::from(units),
            recorded_at: FixtureClock::default_instant()
                + chrono::Duration::minutes(i64::from(minute)),
            is_streaming: true,
        }
    }

    fn passthrough_cache() -> ReadModels {
        let mut cache = MockReadModelCache::new();
        cache.expect_get().returning(|_| Ok(None));
        cache.expect_put().returning(|_, _, _| Ok(()));
        ReadModels::new(Arc::new(cache), Duration::from_secs(30))
    }

    /// Service over `rows` and `live`, with stores 1-2 and items 1-3.
    fn service(rows: Vec<DailySales>, live: Vec<SaleEvent>) -> AnalyticsService {
        let mut history = MockSalesHistory::new();
        history
            .expect_daily()
            .returning(move |since| Ok(rows.iter().filter(|r| r.date >= since).cloned().collect()));
        history
            .expect_latest()
            .returning(move |limit| Ok(live.iter().take(limit).cloned().collect()));
        let mut catalogue = MockStoreCatalogue::new();
        catalogue
            .expect_stores()
            .returning(|| Ok(vec![store(1), store(2)]));
        catalogue
            .expect_items()
            .returning(|| Ok(vec![item(3, "Bakery"), item(1, "Dairy"), item(2, "Dairy")]));
        AnalyticsService::new(
            Arc::new(history),
            Arc::new(catalogue),
            passthrough_cache(),
            Arc::new(FixtureClock::default()),
        )
    }

    fn admin() -> StaffMember {
        staff_with_role(Role::SuperAdmin)
    }

    #[tokio::test]
    async fn kpis_count_periods_and_coverage() {
        // The fixture clock reads 2026-03-02.
        let rows = vec![
            row("2026-01-01", 1, 1, 8),
            row("2026-02-20", 1, 2, 10),
            row("2026-02-24", 2, 1, 30),
            row("2026-03-02", 1, 3, 12),
        ];
        let live = vec![live_sale(2, 1, 4, 5), live_sale(1, 2, 3, 1)];
        let kpis = service(rows, live).kpis(&admin()).await.expect("kpis");
        assert_eq!(kpis.total_historical_records, 4);
        assert_eq!(kpis.total_streaming_records, 2);
        assert_eq!(kpis.total_sales_today, 12);
        assert_eq!(kpis.total_sales_week, 42);
        assert_eq!(kpis.total_sales_month, 52);
        assert_eq!(kpis.average_daily_sales, 15.0);
        assert_eq!((kpis.unique_stores, kpis.unique_items), (2, 3));
        assert_eq!(kpis.data_range_start, Some(date("2026-01-01")));
        assert_eq!(kpis.data_range_end, Some(date("2026-03-02")));
        assert_eq!(
            kpis.last_stream_timestamp,
            Some(FixtureClock::default_instant() + chrono::Duration::minutes(5))
        );
        assert_eq!(kpis.sales_trend, SalesTrend::Up);
    }

    #[tokio::test]
    async fn kpis_only_cover_the_callers_stores() {
        let rows = vec![row("2026-03-02", 1, 1, 5), row("2026-03-02", 2, 1, 50)];
        let live = vec![live_sale(1, 2, 3, 1)];
        let manager = staff_in_stores(Role::StoreManager, &[1]);
        let kpis = service(rows, live).kpis(&manager).await.expect("kpis");
        assert_eq!(kpis.total_sales_today, 5);
        assert_eq!(kpis.total_streaming_records, 0);
        assert_eq!(kpis.last_stream_timestamp, None);
    }

    #[tokio::test]
    async fn forecast_trend_keeps_the_latest_days() {
        let rows: Vec<DailySales> = (1..=20)
            .map(|day| row(&format!("2026-02-{day:02}"), 1, 1, 10))
            .collect();
        let svc = service(rows, Vec::new());
        let with = svc
            .sales_forecast(&admin(), Some(10), true)
            .await
            .expect("trend");
        assert_eq!(with.data.len(), 17);
        assert_eq!(with.data[0].date, date("2026-02-11"));
        assert_eq!(with.data[16].forecast, Some(10));
        let without = svc
            .sales_forecast(&admin(), Some(10), false)
            .await
            .expect("trend");
        assert_eq!(without.data.len(), 10);
        assert!(without.data.iter().all(|point| point.forecast.is_none()));
    }

    #[rstest]
    #[case(Some(6))]
    #[case(Some(366))]
    #[tokio::test]
    async fn forecast_days_are_bounded(#[case] days: Option<u32>) {
        let err = service(Vec::new(), Vec::new())
            .sales_forecast(&admin(), days, true)
            .await
            .expect_err("out of range");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn streaming_trend_accumulates_oldest_first() {
        let live = vec![live_sale(3, 1, 5, 3), live_sale(2, 2, 2, 2), live_sale(1, 1, 1, 1)];
        let trend = service(Vec::new(), live)
            .streaming_trend(&admin())
            .await
            .expect("trend");
        let running: Vec<u64> = trend.data.iter().map(|point| point.cumulative).collect();
        assert_eq!(running, vec![1, 3, 8]);
        assert_eq!(trend.total_streaming, 8);
    }

    #[tokio::test]
    async fn summary_combines_every_chart() {
        let rows = vec![
            row("2026-03-01", 1, 1, 10),
            row("2026-03-01", 2, 3, 30),
            row("2026-03-02", 1, 2, 60),
        ];
        let summary = service(rows, Vec::new())
            .summary(&admin())
            .await
            .expect("summary");
        assert_eq!(summary.sales_trend.len(), 2);
        assert_eq!(summary.store_distribution[0].store_id, 1);
        assert_eq!(summary.store_distribution[0].percentage, 70.0);
        assert_eq!(summary.top_items[0].item_id, 2);
        assert_eq!(summary.category_breakdown[0].category, "Dairy");
    }

    #[tokio::test]
    async fn history_pages_newest_first_with_filters() {
        let rows = vec![
            row("2026-02-27", 1, 1, 1),
            row("2026-02-28", 1, 1, 2),
            row("2026-03-01", 1, 1, 3),
            row("2026-03-01", 2, 1, 9),
            row("2026-03-02", 1, 1, 4),
        ];
        let query = HistoryQuery {
            from: Some(date("2026-02-28")),
            to: Some(date("2026-03-01")),
            store_id: Some(1),
            limit: Some(1),
            offset: Some(1),
            ..HistoryQuery::default()
        };
        let page = service(rows, Vec::new())
            .history(&admin(), &query)
            .await
            .expect("history");
        assert_eq!(page.total, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].date, date("2026-02-28"));
    }

    #[rstest]
    #[case(HistoryQuery { limit: Some(1001), ..HistoryQuery::default() }, ErrorCode::InvalidRequest)]
    #[case(HistoryQuery { store_id: Some(2), ..HistoryQuery::default() }, ErrorCode::Forbidden)]
    #[case(
        HistoryQuery {
            from: Some(date("2026-03-02")),
            to: Some(date("2026-03-01")),
            ..HistoryQuery::default()
        },
        ErrorCode::InvalidRequest
    )]
    #[tokio::test]
    async fn history_rejects_bad_queries(#[case] query: HistoryQuery, #[case] code: ErrorCode) {
        let manager = staff_in_stores(Role::StoreManager, &[1]);
        let err = service(Vec::new(), Vec::new())
            .history(&manager, &query)
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), code);
    }

    #[tokio::test]
    async fn history_lookups_respect_scope() {
        let svc = service(vec![row("2026-03-01", 2, 1, 4)], Vec::new());
        let manager = staff_in_stores(Role::StoreManager, &[1]);
        let range = svc.history_range(&manager).await.expect("range");
        assert_eq!(range.total_records, 0);
        assert_eq!(range.min_date, None);
        let stores = svc.history_stores(&manager).await.expect("stores");
        assert_eq!(stores.stores, vec![store(1)]);
        let items = svc.history_items().await.expect("items");
        let ids: Vec<_> = items.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn predictions_need_a_week_of_history() {
        let rows: Vec<DailySales> = (24..=28)
            .map(|day| row(&format!("2026-02-{day:02}"), 1, 1, 10))
            .collect();
        let err = service(rows, Vec::new())
            .predictions(&admin(), 1, 1, None)
            .await
            .expect_err("too short");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn predictions_follow_the_pair() {
        let mut rows: Vec<DailySales> = (15..=28)
            .map(|day| row(&format!("2026-02-{day:02}"), 1, 1, 10))
            .collect();
        rows.push(row("2026-02-28", 1, 2, 500));
        let predictions = service(rows, Vec::new())
            .predictions(&admin(), 1, 1, Some(3))
            .await
            .expect("predictions");
        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].prediction_date, date("2026-03-01"));
        assert!(predictions.iter().all(|p| p.predicted_sales < 12.0));
    }

    #[tokio::test]
    async fn predictions_outside_scope_are_forbidden() {
        let manager = staff_in_stores(Role::StoreManager, &[1]);
        let err = service(Vec::new(), Vec::new())
            .predictions(&manager, 2, 1, None)
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn sales_report_compares_with_the_previous_period() {
        // Period of 7 days: 2026-02-23..=2026-03-02, previous 2026-02-16..2026-02-23.
        let rows = vec![
            row("2026-02-16", 1, 1, 50),
            row("2026-02-22", 1, 1, 50),
            row("2026-02-23", 1, 1, 40),
            row("2026-03-01", 1, 3, 60),
            row("2026-03-02", 2, 2, 50),
        ];
        let report = service(rows, Vec::new())
            .sales_report(&admin(), None, None)
            .await
            .expect("report");
        assert_eq!(report.period.start_date, date("2026-02-23"));
        assert_eq!(report.period.end_date, date("2026-03-02"));
        assert_eq!(report.kpis.total_sales, 150);
        assert_eq!(report.kpis.total_transactions, 3);
        assert_eq!(report.kpis.avg_basket_size, 50.0);
        assert_eq!(report.kpis.sales_growth, 50.0);
        assert_eq!(report.daily_sales.len(), 3);
        assert_eq!(report.category_breakdown[0].category, "Dairy");
        assert_eq!(report.category_breakdown[0].percentage, 60.0);
        assert_eq!(report.store_performance[0].store_id, 1);
        assert_eq!(report.store_performance[0].transactions, 2);
        assert_eq!(report.top_items[0].item_id, 3);
    }

    #[tokio::test]
    async fn sales_report_narrows_to_one_store() {
        let rows = vec![row("2026-03-01", 1, 1, 7), row("2026-03-01", 2, 1, 9)];
        let report = service(rows, Vec::new())
            .sales_report(&admin(), Some(3), Some(2))
            .await
            .expect("report");
        assert_eq!(report.kpis.total_sales, 9);
        assert_eq!(report.store_performance.len(), 1);
    }

    #[tokio::test]
    async fn performance_ranks_active_stores() {
        let rows = vec![
            row("2026-01-20", 1, 1, 100),
            row("2026-02-20", 1, 1, 150),
            row("2026-02-20", 2, 1, 300),
            row("2025-12-20", 2, 1, 999),
        ];
        let report = service(rows, Vec::new())
            .performance_report(&admin(), None)
            .await
            .expect("report");
        assert_eq!(report.period_days, 30);
        let ids: Vec<_> = report.stores.iter().map(|s| s.store_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(report.stores[1].previous_sales, 100);
        assert_eq!(report.stores[1].growth_rate, 50.0);
        assert_eq!(report.stores[0].growth_rate, 0.0);
    }

    #[tokio::test]
    async fn inventory_movement_counts_distinct_items_per_day() {
        let rows = vec![
            row("2026-03-01", 1, 1, 4),
            row("2026-03-01", 2, 1, 6),
            row("2026-03-01", 1, 3, 5),
            row("2026-03-02", 1, 2, 0),
            row("2026-01-01", 1, 1, 90),
        ];
        let movement = service(rows, Vec::new())
            .inventory_movement(&admin(), Some(7))
            .await
            .expect("movement");
        assert_eq!(movement.daily_trend.len(), 2);
        assert_eq!(movement.daily_trend[0].items_sold, 2);
        assert_eq!(movement.daily_trend[1].items_sold, 0);
        assert_eq!(movement.total_movement, 15);
        assert_eq!(movement.top_categories[0].category, "Dairy");
        assert_eq!(movement.top_categories[0].item_count, 2);
    }
}
