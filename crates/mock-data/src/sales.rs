//! Daily sales history and the live sale ticker.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::catalogue::ItemSeed;
use crate::stores::StoreSeed;

/// Lowest and highest base daily demand assigned to a store/item pair.
const BASE_DEMAND_MIN: f64 = 4.0;
const BASE_DEMAND_MAX: f64 = 70.0;
/// Day-to-day noise band around the seasonal demand.
const DAILY_NOISE: f64 = 0.25;
/// Weekly seasonality amplitude.
const SEASONAL_AMPLITUDE: f64 = 0.1;

/// Fallback statistics when a pair has no history.
const DEFAULT_MEAN: f64 = 15.0;
const DEFAULT_STD: f64 = 5.0;
const DEFAULT_MAX: f64 = 50.0;

/// Units sold for one item at one store on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySalesSeed {
    /// Store identifier.
    pub store_id: u32,
    /// Item identifier.
    pub item_id: u32,
    /// Trading day.
    pub date: NaiveDate,
    /// Units sold.
    pub units: u32,
    /// Revenue in AED.
    pub revenue: f64,
}

/// Weekly demand multiplier for a trading day.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use mock_data::seasonality_factor;
///
/// let monday = NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date");
/// assert!((seasonality_factor(monday) - 1.0).abs() < f64::EPSILON);
/// ```
#[must_use]
pub fn seasonality_factor(date: NaiveDate) -> f64 {
    let day = f64::from(date.weekday().num_days_from_monday());
    1.0 + SEASONAL_AMPLITUDE * (TAU * day / 7.0).sin()
}

pub(crate) fn generate_history(
    rng: &mut ChaCha8Rng,
    stores: &[StoreSeed],
    items: &[ItemSeed],
    days: &[NaiveDate],
) -> Vec<DailySalesSeed> {
    let mut out = Vec::with_capacity(stores.len() * items.len() * days.len());
    for store in stores {
        for item in items {
            let base = rng.random_range(BASE_DEMAND_MIN..BASE_DEMAND_MAX);
            for date in days {
                let noise = rng.random_range((1.0 - DAILY_NOISE)..(1.0 + DAILY_NOISE));
                let units = to_units(base * seasonality_factor(*date) * noise);
                out.push(DailySalesSeed {
                    store_id: store.id,
                    item_id: item.id,
                    date: *date,
                    units,
                    revenue: round_cents(f64::from(units) * item.unit_price),
                });
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PairStats {
    mean: f64,
    std: f64,
    min: f64,
    max: f64,
}

impl Default for PairStats {
    fn default() -> Self {
        Self {
            mean: DEFAULT_MEAN,
            std: DEFAULT_STD,
            min: 0.0,
            max: DEFAULT_MAX,
        }
    }
}

/// A single live sale produced by [`SaleTicker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleTick {
    /// Store identifier.
    pub store_id: u32,
    /// Item identifier.
    pub item_id: u32,
    /// Units sold.
    pub units: u32,
    /// When the sale was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Deterministic generator of live sales.
///
/// Each tick picks a store and item at random and draws a unit count around
/// the pair's historical mean, scaled by the weekly seasonality and clipped to
/// the historical range.
#[derive(Debug, Clone)]
pub struct SaleTicker {
    rng: ChaCha8Rng,
    store_ids: Vec<u32>,
    item_ids: Vec<u32>,
    stats: BTreeMap<(u32, u32), PairStats>,
}

impl SaleTicker {
    /// Build a ticker from historical sales.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use mock_data::SaleTicker;
    ///
    /// let mut ticker = SaleTicker::new(9, vec![1, 2], vec![10], &[]);
    /// let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single().expect("valid");
    /// let tick = ticker.next_tick(now).expect("pairs available");
    /// assert_eq!(tick.item_id, 10);
    /// ```
    #[must_use]
    pub fn new(
        seed: u64,
        store_ids: Vec<u32>,
        item_ids: Vec<u32>,
        history: &[DailySalesSeed],
    ) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            store_ids,
            item_ids,
            stats: pair_stats(history),
        }
    }

    /// Produce the next sale, or `None` when there are no stores or items.
    pub fn next_tick(&mut self, now: DateTime<Utc>) -> Option<SaleTick> {
        let store_id = pick(&mut self.rng, &self.store_ids)?;
        let item_id = pick(&mut self.rng, &self.item_ids)?;
        let stats = self
            .stats
            .get(&(store_id, item_id))
            .copied()
            .unwrap_or_default();
        // Uniform band with the same variance as the historical spread.
        let spread = stats.std * 3.0_f64.sqrt();
        let jitter = if spread > 0.0 {
            self.rng.random_range(-spread..spread)
        } else {
            0.0
        };
        let raw = (stats.mean + jitter) * seasonality_factor(now.date_naive());
        let units = to_units(raw.clamp(stats.min, stats.max.max(stats.min)));
        Some(SaleTick {
            store_id,
            item_id,
            units,
            recorded_at: now,
        })
    }
}

fn pick(rng: &mut ChaCha8Rng, ids: &[u32]) -> Option<u32> {
    if ids.is_empty() {
        return None;
    }
    ids.get(rng.random_range(0..ids.len())).copied()
}

fn pair_stats(history: &[DailySalesSeed]) -> BTreeMap<(u32, u32), PairStats> {
    let mut grouped: BTreeMap<(u32, u32), Vec<f64>> = BTreeMap::new();
    for record in history {
        grouped
            .entry((record.store_id, record.item_id))
            .or_default()
            .push(f64::from(record.units));
    }
    grouped
        .into_iter()
        .map(|(pair, values)| (pair, summarise(&values)))
        .collect()
}

fn summarise(values: &[f64]) -> PairStats {
    let count = values.len() as f64;
    if values.is_empty() {
        return PairStats::default();
    }
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    PairStats {
        mean,
        std: variance.sqrt(),
        min,
        max,
    }
}

fn to_units(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // Demand figures stay far below u32::MAX.
    value.round().min(f64::from(u32::MAX)) as u32
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;
    use crate::catalogue::catalogue;
    use crate::stores::STORES;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("valid date")
    }

    #[rstest]
    #[case(2, 1.0)]
    #[case(3, 1.0 + 0.1 * (TAU / 7.0).sin())]
    #[case(8, 1.0 + 0.1 * (TAU * 6.0 / 7.0).sin())]
    fn seasonality_follows_weekday(#[case] date: u32, #[case] expected: f64) {
        assert!((seasonality_factor(day(date)) - expected).abs() < 1e-12);
    }

    #[test]
    fn history_covers_every_pair_and_day() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let items = catalogue();
        let days = [day(2), day(3), day(4)];
        let history = generate_history(&mut rng, &STORES, &items, &days);
        assert_eq!(history.len(), STORES.len() * items.len() * days.len());
    }

    #[test]
    fn revenue_matches_units_and_price() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let items = catalogue();
        let history = generate_history(&mut rng, &STORES, &items, &[day(2)]);
        let record = history.first().expect("history present");
        let item = items.first().expect("item present");
        let expected = round_cents(f64::from(record.units) * item.unit_price);
        assert!((record.revenue - expected).abs() < 1e-9);
    }

    #[test]
    fn ticker_stays_within_history_bounds() {
        let history = vec![
            DailySalesSeed {
                store_id: 1,
                item_id: 1,
                date: day(2),
                units: 10,
                revenue: 0.0,
            },
            DailySalesSeed {
                store_id: 1,
                item_id: 1,
                date: day(3),
                units: 20,
                revenue: 0.0,
            },
        ];
        let mut ticker = SaleTicker::new(3, vec![1], vec![1], &history);
        let now = Utc
            .with_ymd_and_hms(2026, 3, 4, 12, 0, 0)
            .single()
            .expect("valid time");
        for _ in 0..50 {
            let tick = ticker.next_tick(now).expect("tick");
            assert!((10..=20).contains(&tick.units), "units {}", tick.units);
        }
    }

    #[test]
    fn ticker_without_stores_yields_nothing() {
        let mut ticker = SaleTicker::new(3, Vec::new(), vec![1], &[]);
        assert!(ticker.next_tick(Utc::now()).is_none());
    }

    #[test]
    fn same_seed_yields_same_ticks() {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 4, 12, 0, 0)
            .single()
            .expect("valid time");
        let mut first = SaleTicker::new(21, vec![1, 2, 3], vec![4, 5], &[]);
        let mut second = SaleTicker::new(21, vec![1, 2, 3], vec![4, 5], &[]);
        for _ in 0..10 {
            assert_eq!(first.next_tick(now), second.next_tick(now));
        }
    }

    #[rstest]
    #[case(-3.0, 0)]
    #[case(f64::NAN, 0)]
    #[case(4.4, 4)]
    #[case(4.6, 5)]
    fn units_are_rounded_and_floored(#[case] raw: f64, #[case] expected: u32) {
        assert_eq!(to_units(raw), expected);
    }
}
