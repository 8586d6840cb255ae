//! Pure alert detection over stock positions and daily sales.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};

use super::{AlertSeverity, AlertType};
use crate::domain::catalogue::{CatalogueItem, Store};
use crate::domain::inventory::InventoryItem;
use crate::domain::sales::DailySales;
use crate::domain::staff::{ItemId, StoreId};

/// Standard deviations from the mean that count as a sales anomaly.
pub const ANOMALY_SIGMA: f64 = 2.0;
/// Week-over-week change, in percent, that counts as notable.
pub const STORE_CHANGE_THRESHOLD_PCT: f64 = 15.0;

const MAX_STOCK_FINDINGS: usize = 10;
const MAX_ANOMALY_FINDINGS: usize = 5;

/// A condition worth alerting on, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub fingerprint: String,
    pub title: String,
    pub message: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub store_id: Option<StoreId>,
    pub store_name: Option<String>,
    pub item_id: Option<ItemId>,
}

/// Positions at or below their reorder level, emptiest first.
pub fn stock_findings(positions: &[InventoryItem]) -> Vec<Finding> {
    let mut low: Vec<&InventoryItem> = positions
        .iter()
        .filter(|p| p.quantity <= p.reorder_level)
        .collect();
    low.sort_by_key(|p| (p.quantity, p.store_id, p.item_id));
    low.into_iter()
        .take(MAX_STOCK_FINDINGS)
        .map(|p| {
            let out = p.quantity <= 0;
            Finding {
                fingerprint: format!("stock:{}:{}", p.store_id, p.item_id),
                title: format!(
                    "{}: {}",
                    if out { "Out of Stock" } else { "Low Stock" },
                    p.item_name
                ),
                message: format!(
                    "{} at {} has only {} units remaining (reorder level: {})",
                    p.item_name, p.store_name, p.quantity, p.reorder_level
                ),
                alert_type: AlertType::Inventory,
                severity: if out {
                    AlertSeverity::Critical
                } else {
                    AlertSeverity::Warning
                },
                store_id: Some(p.store_id),
                store_name: Some(p.store_name.clone()),
                item_id: Some(p.item_id),
            }
        })
        .collect()
}

struct Names<'a> {
    stores: HashMap<StoreId, &'a str>,
    items: HashMap<ItemId, &'a str>,
}

impl<'a> Names<'a> {
    fn new(stores: &'a [Store], items: &'a [CatalogueItem]) -> Self {
        Self {
            stores: stores.iter().map(|s| (s.id, s.name.as_str())).collect(),
            items: items.iter().map(|i| (i.id, i.name.as_str())).collect(),
        }
    }

    fn store(&self, id: StoreId) -> String {
        self.stores
            .get(&id)
            .map_or_else(|| format!("Store {id}"), |name| (*name).to_owned())
    }

    fn item(&self, id: ItemId) -> String {
        self.items
            .get(&id)
            .map_or_else(|| format!("Item {id}"), |name| (*name).to_owned())
    }
}

/// Mean and sample standard deviation; `None` below two samples.
fn mean_and_deviation(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0);
    Some((mean, variance.sqrt()))
}

/// Store/item pairs whose latest day sits more than [`ANOMALY_SIGMA`]
/// deviations from the mean of `rows`.
///
/// `rows` is the detection window, usually the last seven days.
pub fn sales_anomalies(
    rows: &[DailySales],
    stores: &[Store],
    items: &[CatalogueItem],
) -> Vec<Finding> {
    let Some(latest) = rows.iter().map(|row| row.date).max() else {
        return Vec::new();
    };
    let names = Names::new(stores, items);
    let mut series: BTreeMap<(StoreId, ItemId), Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for row in rows {
        series
            .entry((row.store_id, row.item_id))
            .or_default()
            .push((row.date, row.units as f64));
    }
    series
        .into_iter()
        .filter_map(|((store_id, item_id), points)| {
            let values: Vec<f64> = points.iter().map(|(_, units)| *units).collect();
            let (mean, deviation) = mean_and_deviation(&values)?;
            let today = points
                .iter()
                .find(|(date, _)| *date == latest)
                .map(|(_, units)| *units)?;
            if deviation <= 0.0 || (today - mean).abs() <= ANOMALY_SIGMA * deviation {
                return None;
            }
            let high = today > mean;
            let item = names.item(item_id);
            let store = names.store(store_id);
            Some(Finding {
                fingerprint: format!("anomaly:{store_id}:{item_id}:{latest}"),
                title: format!("{} Sales Alert: {item}", if high { "High" } else { "Low" }),
                message: format!(
                    "{item} at {store} had {} sales ({today:.0} vs avg {mean:.0})",
                    if high { "unusually high" } else { "unusually low" }
                ),
                alert_type: AlertType::Sales,
                severity: if high {
                    AlertSeverity::Info
                } else {
                    AlertSeverity::Warning
                },
                store_id: Some(store_id),
                store_name: Some(store),
                item_id: Some(item_id),
            })
        })
        .take(MAX_ANOMALY_FINDINGS)
        .collect()
}

/// Stores whose last seven days differ from the seven before by more than
/// [`STORE_CHANGE_THRESHOLD_PCT`].
pub fn store_performance(rows: &[DailySales], today: NaiveDate, stores: &[Store]) -> Vec<Finding> {
    let week_ago = today - Duration::days(7);
    let fortnight_ago = today - Duration::days(14);
    let mut weeks: BTreeMap<StoreId, (u64, u64)> = BTreeMap::new();
    for row in rows {
        let entry = weeks.entry(row.store_id).or_default();
        if row.date >= week_ago {
            entry.0 += row.units;
        } else if row.date >= fortnight_ago {
            entry.1 += row.units;
        }
    }
    let names = Names::new(stores, &[]);
    weeks
        .into_iter()
        .filter(|(_, (_, last_week))| *last_week > 0)
        .filter_map(|(store_id, (this_week, last_week))| {
            let change = (this_week as f64 - last_week as f64) / last_week as f64 * 100.0;
            if change.abs() <= STORE_CHANGE_THRESHOLD_PCT {
                return None;
            }
            let increase = change > 0.0;
            let store = names.store(store_id);
            Some(Finding {
                fingerprint: format!("store:{store_id}:{today}"),
                title: format!("Store Performance: {store}"),
                message: format!(
                    "{store} sales {} by {:.1}% this week",
                    if increase { "increased" } else { "decreased" },
                    change.abs()
                ),
                alert_type: AlertType::Sales,
                severity: if increase {
                    AlertSeverity::Info
                } else {
                    AlertSeverity::Warning
                },
                store_id: Some(store_id),
                store_name: Some(store),
                item_id: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::StockStatus;
    use rstest::rstest;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, n).expect("valid date")
    }

    fn position(item_id: ItemId, quantity: i64) -> InventoryItem {
        InventoryItem {
            item_id,
            item_name: format!("Item {item_id}"),
            category: "Dairy".to_owned(),
            store_id: 1,
            store_name: "Karama Hypermarket".to_owned(),
            quantity,
            reorder_level: 25,
            max_stock_level: 250,
            unit_cost: 15.0,
            stock_value: 0.0,
            last_restocked: None,
            status: StockStatus::classify(quantity, 25, 250),
        }
    }

    fn row(store_id: StoreId, item_id: ItemId, date: NaiveDate, units: u64) -> DailySales {
        DailySales {
            date,
            store_id,
            item_id,
            units,
            revenue: 0.0,
        }
    }

    fn store(id: StoreId, name: &str) -> Store {
        Store {
            id,
            name: name.to_owned(),
            city: "Dubai".to_owned(),
            region_id: 1,
        }
    }

    #[rstest]
    fn stock_findings_put_empty_shelves_first() {
        let findings = stock_findings(&[position(1, 20), position(2, 0), position(3, 90)]);
        let titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Out of Stock: Item 2", "Low Stock: Item 1"]);
        assert_eq!(findings.first().map(|f| f.severity), Some(AlertSeverity::Critical));
        assert_eq!(
            findings.get(1).map(|f| f.message.as_str()),
            Some("Item 1 at Karama Hypermarket has only 20 units remaining (reorder level: 25)")
        );
    }

    #[rstest]
    fn spike_on_latest_day_is_an_anomaly() {
        let mut rows: Vec<DailySales> = (1..=6).map(|d| row(1, 7, day(d), 10)).collect();
        rows.push(row(1, 7, day(7), 40));
        rows.extend((1..=7).map(|d| row(2, 7, day(d), 10)));
        let findings = sales_anomalies(&rows, &[store(1, "Al Barsha")], &[]);
        assert_eq!(findings.len(), 1);
        let finding = findings.first().expect("one anomaly");
        assert_eq!(finding.title, "High Sales Alert: Item 7");
        assert_eq!(finding.severity, AlertSeverity::Info);
        assert_eq!(finding.message, "Item 7 at Al Barsha had unusually high sales (40 vs avg 14)");
        assert_eq!(finding.fingerprint, "anomaly:1:7:2026-03-07");
    }

    #[rstest]
    fn flat_series_raise_nothing() {
        let rows: Vec<DailySales> = (1..=7).map(|d| row(1, 7, day(d), 12)).collect();
        assert!(sales_anomalies(&rows, &[], &[]).is_empty());
    }

    #[rstest]
    #[case(120, 100, Some(("Al Barsha sales increased by 20.0% this week", AlertSeverity::Info)))]
    #[case(80, 100, Some(("Al Barsha sales decreased by 20.0% this week", AlertSeverity::Warning)))]
    #[case(110, 100, None)]
    #[case(50, 0, None)]
    fn week_over_week_changes(
        #[case] this_week: u64,
        #[case] last_week: u64,
        #[case] expected: Option<(&str, AlertSeverity)>,
    ) {
        let today = day(20);
        let rows = vec![
            row(1, 1, today - Duration::days(2), this_week),
            row(1, 1, today - Duration::days(10), last_week),
        ];
        let findings = store_performance(&rows, today, &[store(1, "Al Barsha")]);
        let actual = findings
            .first()
            .map(|f| (f.message.as_str(), f.severity));
        assert_eq!(actual, expected);
    }
}
