//! Whole-dataset generation.

use chrono::{Days, NaiveDate};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::catalogue::{ItemSeed, catalogue};
use crate::error::GenerationError;
use crate::promotions::{PromotionSeed, generate_promotions};
use crate::sales::{DailySalesSeed, generate_history};
use crate::staff::{StaffSeed, generate_staff};
use crate::stores::{STORES, StoreSeed};

const DEFAULT_HISTORY_DAYS: u32 = 30;
const MAX_HISTORY_DAYS: u32 = 365;

/// Parameters controlling dataset generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetOptions {
    seed: u64,
    anchor: NaiveDate,
    history_days: u32,
}

impl DatasetOptions {
    /// Options for a seed and the last trading day of the history window.
    #[must_use]
    pub const fn new(seed: u64, anchor: NaiveDate) -> Self {
        Self {
            seed,
            anchor,
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }

    /// Override the number of trading days of history, ending at the anchor.
    #[must_use]
    pub const fn with_history_days(mut self, days: u32) -> Self {
        self.history_days = days;
        self
    }

    /// Seed used for every random draw.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Last trading day covered by the history.
    #[must_use]
    pub const fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Number of trading days of history.
    #[must_use]
    pub const fn history_days(&self) -> u32 {
        self.history_days
    }
}

/// A complete generated dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockDataset {
    /// Store directory.
    pub stores: Vec<StoreSeed>,
    /// Catalogue items.
    pub items: Vec<ItemSeed>,
    /// Staff directory.
    pub staff: Vec<StaffSeed>,
    /// Daily sales per store and item, oldest first.
    pub sales: Vec<DailySalesSeed>,
    /// Promotions around the anchor date.
    pub promotions: Vec<PromotionSeed>,
}

/// Generate a dataset.
///
/// # Errors
///
/// Returns [`GenerationError`] if the history window is empty, longer than a
/// year, or reaches before the earliest representable date, or if staff name
/// generation keeps failing.
pub fn generate_dataset(options: &DatasetOptions) -> Result<MockDataset, GenerationError> {
    let days = history_window(options.anchor, options.history_days)?;
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let stores = STORES.to_vec();
    let items = catalogue();
    let staff = generate_staff(&mut rng)?;
    let sales = generate_history(&mut rng, &stores, &items, &days);
    let promotions = generate_promotions(&mut rng, options.anchor);
    Ok(MockDataset {
        stores,
        items,
        staff,
        sales,
        promotions,
    })
}

fn history_window(anchor: NaiveDate, days: u32) -> Result<Vec<NaiveDate>, GenerationError> {
    if days == 0 {
        return Err(GenerationError::EmptyHistory);
    }
    if days > MAX_HISTORY_DAYS {
        return Err(GenerationError::HistoryTooLong {
            requested: days,
            max: MAX_HISTORY_DAYS,
        });
    }
    let first = anchor
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .ok_or(GenerationError::AnchorOutOfRange { days })?;
    Ok(first.iter_days().take(days as usize).collect())
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
    }

    #[rstest]
    fn same_options_produce_identical_datasets(anchor: NaiveDate) {
        let options = DatasetOptions::new(42, anchor).with_history_days(7);
        let first = generate_dataset(&options).expect("generated");
        let second = generate_dataset(&options).expect("generated");
        assert_eq!(first, second);
    }

    #[rstest]
    fn different_seeds_produce_different_sales(anchor: NaiveDate) {
        let first = generate_dataset(&DatasetOptions::new(1, anchor).with_history_days(7))
            .expect("generated");
        let second = generate_dataset(&DatasetOptions::new(2, anchor).with_history_days(7))
            .expect("generated");
        assert_ne!(first.sales, second.sales);
    }

    #[rstest]
    fn history_ends_on_anchor(anchor: NaiveDate) {
        let dataset = generate_dataset(&DatasetOptions::new(42, anchor).with_history_days(5))
            .expect("generated");
        let latest = dataset.sales.iter().map(|record| record.date).max();
        let earliest = dataset.sales.iter().map(|record| record.date).min();
        assert_eq!(latest, Some(anchor));
        assert_eq!(
            earliest,
            anchor.checked_sub_days(Days::new(4)),
            "window spans five days"
        );
    }

    #[rstest]
    #[case(0, GenerationError::EmptyHistory)]
    #[case(366, GenerationError::HistoryTooLong { requested: 366, max: 365 })]
    fn rejects_invalid_windows(
        anchor: NaiveDate,
        #[case] days: u32,
        #[case] expected: GenerationError,
    ) {
        let err = generate_dataset(&DatasetOptions::new(42, anchor).with_history_days(days))
            .expect_err("window rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn default_window_is_thirty_days(anchor: NaiveDate) {
        let options = DatasetOptions::new(42, anchor);
        assert_eq!(options.history_days(), 30);
        assert_eq!(options.seed(), 42);
        assert_eq!(options.anchor(), anchor);
    }
}
