//! Seed promotions spread around the anchor date.

use chrono::{Days, NaiveDate};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::catalogue::CATEGORY_UNIT_COSTS;
use crate::stores::STORES;

const PROMOTION_COUNT: usize = 8;
const PERCENTAGE_STEPS: [f64; 4] = [10.0, 15.0, 20.0, 25.0];
const NAME_SUFFIXES: [&str; 4] = ["Saver", "Weekend Deal", "Flash Sale", "Family Pack Offer"];

/// Discount mechanics for a seeded promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKindSeed {
    /// Percentage off the shelf price.
    Percentage,
    /// Fixed amount off in AED.
    Fixed,
    /// Buy one, get one free.
    Bogo,
}

/// A generated promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionSeed {
    /// Promotion title.
    pub name: String,
    /// Category the promotion applies to.
    pub category: String,
    /// Discount mechanics.
    pub discount_kind: DiscountKindSeed,
    /// Percentage or AED amount depending on the kind.
    pub discount_value: f64,
    /// First trading day.
    pub start_date: NaiveDate,
    /// Last trading day.
    pub end_date: NaiveDate,
    /// Participating stores.
    pub store_ids: Vec<u32>,
    /// Redemptions so far.
    pub redemptions: u32,
}

pub(crate) fn generate_promotions(rng: &mut ChaCha8Rng, anchor: NaiveDate) -> Vec<PromotionSeed> {
    (0..PROMOTION_COUNT)
        .filter_map(|_| generate_one(rng, anchor))
        .collect()
}

fn generate_one(rng: &mut ChaCha8Rng, anchor: NaiveDate) -> Option<PromotionSeed> {
    let (category, _) = CATEGORY_UNIT_COSTS.get(rng.random_range(0..CATEGORY_UNIT_COSTS.len()))?;
    let suffix = NAME_SUFFIXES.get(rng.random_range(0..NAME_SUFFIXES.len()))?;
    let (discount_kind, discount_value) = match rng.random_range(0..3_u8) {
        0 => (
            DiscountKindSeed::Percentage,
            *PERCENTAGE_STEPS.get(rng.random_range(0..PERCENTAGE_STEPS.len()))?,
        ),
        1 => (DiscountKindSeed::Fixed, f64::from(rng.random_range(2..=10_u32))),
        _ => (DiscountKindSeed::Bogo, 100.0),
    };
    // Offsets place promotions in the past, present and future of the anchor.
    let start_offset = rng.random_range(0..28_u64);
    let length = rng.random_range(3..14_u64);
    let start_date = anchor
        .checked_sub_days(Days::new(start_offset))?
        .checked_add_days(Days::new(7))?;
    let end_date = start_date.checked_add_days(Days::new(length))?;
    let picked = STORES
        .iter()
        .filter(|_| rng.random_ratio(1, 2))
        .map(|store| store.id)
        .collect::<Vec<_>>();
    let store_ids = if picked.is_empty() { vec![1] } else { picked };
    Some(PromotionSeed {
        name: format!("{category} {suffix}"),
        category: (*category).to_owned(),
        discount_kind,
        discount_value,
        start_date,
        end_date,
        store_ids,
        redemptions: rng.random_range(0..500),
    })
}
