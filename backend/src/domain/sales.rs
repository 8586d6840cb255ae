//! Sales history, live sale events and the analytics built on them.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use utoipa::ToSchema;

use super::catalogue::{CURRENCY, round2};
use super::ports::{
    LiveEventBus, SalesHistory, SalesHistoryError, StoreCatalogue, StoreCatalogueError,
};
use super::read_model::ReadModels;
use super::staff::{ItemId, StaffMember, StoreId};
use super::{Error, LiveEvent};

const DEFAULT_LATEST: u32 = 20;
const MAX_LATEST: u32 = 100;
const DEFAULT_TREND_DAYS: u32 = 30;
const MIN_TREND_DAYS: u32 = 7;
const MAX_TREND_DAYS: u32 = 90;
/// Relative week-over-week change treated as a trend.
const TREND_THRESHOLD: f64 = 0.05;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u64)]
pub struct SaleId(pub u64);

impl std::fmt::Display for SaleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Units sold of one item at one store on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub store_id: StoreId,
    pub item_id: ItemId,
    pub units: u64,
    pub revenue: f64,
}

/// A single sale, as pushed on `/stream/sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SaleEvent {
    pub id: SaleId,
    pub store_id: StoreId,
    pub store_name: String,
    pub item_id: ItemId,
    pub item_name: String,
    pub units: u32,
    pub revenue: f64,
    pub recorded_at: DateTime<Utc>,
    /// `true` for sales produced by the live generator.
    pub is_streaming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SalesTrend {
    Up,
    Down,
    Stable,
}

impl SalesTrend {
    /// Compare this week's units with last week's.
    pub fn between(previous: u64, current: u64) -> Self {
        if previous == 0 {
            return SalesTrend::Stable;
        }
        let change = (current as f64 - previous as f64) / previous as f64;
        if change > TREND_THRESHOLD {
            SalesTrend::Up
        } else if change < -TREND_THRESHOLD {
            SalesTrend::Down
        } else {
            SalesTrend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TopItem {
    pub item_id: ItemId,
    pub item_name: String,
    pub units: u64,
}

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesMetrics {
    pub total_sales_today: u64,
    pub total_sales_week: u64,
    pub total_sales_month: u64,
    pub revenue_today: f64,
    pub average_daily_sales: f64,
    pub sales_trend: SalesTrend,
    pub streaming_records_count: usize,
    pub active_stores: usize,
    pub top_item: Option<TopItem>,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub units: u64,
    pub revenue: f64,
}

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

/// `value` or `default`, rejected when outside `min..=max`.
pub(crate) fn bounded(
    value: Option<u32>,
    default: u32,
    min: u32,
    max: u32,
    name: &str,
) -> Result<u32, Error> {
    let value = value.unwrap_or(default);
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(Error::invalid_request(format!("{name} must be between {min} and {max}"))
            .with_details(json!({ "field": name, "code": "out_of_range" })))
    }
}

/// Live sales and sales analytics.
#[derive(Clone)]
pub struct SalesService {
    history: Arc<dyn SalesHistory>,
    catalogue: Arc<dyn StoreCatalogue>,
    bus: Arc<dyn LiveEventBus>,
    read_models: ReadModels,
    clock: Arc<dyn Clock>,
}

impl SalesService {
    pub fn new(
        history: Arc<dyn SalesHistory>,
        catalogue: Arc<dyn StoreCatalogue>,
        bus: Arc<dyn LiveEventBus>,
        read_models: ReadModels,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            history,
            catalogue,
            bus,
            read_models,
            clock,
        }
    }

    /// Record a generated sale and broadcast it.
    pub async fn record_sale(
        &self,
        store_id: StoreId,
        item_id: ItemId,
        units: u32,
        recorded_at: DateTime<Utc>,
    ) -> Result<SaleEvent, Error> {
        let store = self
            .catalogue
            .store(store_id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| Error::not_found(format!("store {store_id} not found")))?;
        let item = self
            .catalogue
            .item(item_id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| Error::not_found(format!("item {item_id} not found")))?;
        let revenue = round2(f64::from(units) * item.unit_price);
        let sale = SaleEvent {
            id: self.history.next_sale_id().await.map_err(map_history_error)?,
            store_id,
            store_name: store.name,
            item_id,
            item_name: item.name,
            units,
            revenue,
            recorded_at,
            is_streaming: true,
        };
        self.history
            .record(&sale, revenue)
            .await
            .map_err(map_history_error)?;
        debug!(sale_id = sale.id.0, store_id, item_id, units, "sale recorded");
        self.bus.publish(LiveEvent::Sale(sale.clone()));
        Ok(sale)
    }

    /// Most recent live sales in the caller's scope.
    pub async fn latest(
        &self,
        actor: &StaffMember,
        limit: Option<u32>,
    ) -> Result<Vec<SaleEvent>, Error> {
        let limit = bounded(limit, DEFAULT_LATEST, 1, MAX_LATEST, "limit")? as usize;
        let all = self
            .history
            .latest(usize::MAX)
            .await
            .map_err(map_history_error)?;
        let mut visible = actor.scope.filter(all, |sale| sale.store_id);
        visible.truncate(limit);
        Ok(visible)
    }

    async fn visible_daily(
        &self,
        actor: &StaffMember,
        since: NaiveDate,
        store_id: Option<StoreId>,
    ) -> Result<Vec<DailySales>, Error> {
        let rows = self.history.daily(since).await.map_err(map_history_error)?;
        Ok(actor
            .scope
            .filter(rows, |row| row.store_id)
            .into_iter()
            .filter(|row| store_id.is_none_or(|id| row.store_id == id))
            .collect())
    }

    /// Today, week and month totals plus the week-over-week trend.
    pub async fn metrics(
        &self,
        actor: &StaffMember,
        store_id: Option<StoreId>,
    ) -> Result<SalesMetrics, Error> {
        if let Some(id) = store_id.filter(|id| !actor.scope.contains(*id)) {
            return Err(Error::forbidden(format!("store {id} is outside your scope")));
        }
        let today = self.clock.utc().date_naive();
        let week_ago = today - Duration::days(7);
        let fortnight_ago = today - Duration::days(14);
        let month_ago = today - Duration::days(30);
        let rows = self.visible_daily(actor, month_ago, store_id).await?;
        let units_where = |pred: &dyn Fn(NaiveDate) -> bool| -> u64 {
            rows.iter().filter(|r| pred(r.date)).map(|r| r.units).sum()
        };
        let total_today = units_where(&|d| d == today);
        let total_week = units_where(&|d| d >= week_ago);
        let previous_week = units_where(&|d| d >= fortnight_ago && d < week_ago);
        let total_month = units_where(&|d| d >= month_ago);
        let revenue_today = round2(
            rows.iter()
                .filter(|r| r.date == today)
                .map(|r| r.revenue)
                .sum(),
        );
        let days: HashSet<NaiveDate> = rows.iter().map(|r| r.date).collect();
        let average_daily_sales = if days.is_empty() {
            0.0
        } else {
            round2(total_month as f64 / days.len() as f64)
        };
        let active_stores = rows
            .iter()
            .filter(|r| r.date == today && r.units > 0)
            .map(|r| r.store_id)
            .collect::<HashSet<_>>()
            .len();
        let mut per_item: HashMap<ItemId, u64> = HashMap::new();
        for row in rows.iter().filter(|r| r.date == today) {
            *per_item.entry(row.item_id).or_default() += row.units;
        }
        let top_item = match per_item
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        {
            Some((item_id, units)) => {
                let item_name = self
                    .catalogue
                    .item(item_id)
                    .await
                    .map_err(map_catalogue_error)?
                    .map_or_else(|| format!("Item {item_id}"), |item| item.name);
                Some(TopItem {
                    item_id,
                    item_name,
                    units,
                })
            }
            None => None,
        };
        let streaming = self
            .history
            .latest(usize::MAX)
            .await
            .map_err(map_history_error)?;
        let streaming_records_count = actor
            .scope
            .filter(streaming, |sale| sale.store_id)
            .into_iter()
            .filter(|sale| store_id.is_none_or(|id| sale.store_id == id))
            .count();
        Ok(SalesMetrics {
            total_sales_today: total_today,
            total_sales_week: total_week,
            total_sales_month: total_month,
            revenue_today,
            average_daily_sales,
            sales_trend: SalesTrend::between(previous_week, total_week),
            streaming_records_count,
            active_stores,
            top_item,
            currency: CURRENCY.to_owned(),
        })
    }

    /// Daily units and revenue for the last `days` days, oldest first.
    pub async fn trend(
        &self,
        actor: &StaffMember,
        days: Option<u32>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<TrendPoint>, Error> {
        let days = bounded(days, DEFAULT_TREND_DAYS, MIN_TREND_DAYS, MAX_TREND_DAYS, "days")?;
        if let Some(id) = store_id.filter(|id| !actor.scope.contains(*id)) {
            return Err(Error::forbidden(format!("store {id} is outside your scope")));
        }
        let today = self.clock.utc().date_naive();
        let params = json!({ "days": days, "store_id": store_id, "scope": actor.scope, "today": today });
        self.read_models
            .get_or_compute("sales-trend", &params, || async {
                let since = today - Duration::days(i64::from(days) - 1);
                let mut by_day: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
                for offset in 0..i64::from(days) {
                    by_day.insert(since + Duration::days(offset), (0, 0.0));
                }
                for row in self.visible_daily(actor, since, store_id).await? {
                    if let Some(entry) = by_day.get_mut(&row.date) {
                        entry.0 += row.units;
                        entry.1 += row.revenue;
                    }
                }
                Ok(by_day
                    .into_iter()
                    .map(|(date, (units, revenue))| TrendPoint {
                        date,
                        units,
                        revenue: round2(revenue),
                    })
                    .collect())
            })
            .await
    }
}
