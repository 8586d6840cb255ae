//! Catalogue items and category cost table.

use serde::{Deserialize, Serialize};

/// Unit cost in AED used when a category is missing from the cost table.
pub const DEFAULT_UNIT_COST: f64 = 20.0;

/// Retail markup applied on top of unit cost.
const RETAIL_MARKUP: f64 = 1.35;

/// Average unit cost per category, in AED.
pub const CATEGORY_UNIT_COSTS: [(&str, f64); 22] = [
    ("Rice & Grains", 25.0),
    ("Bakery", 8.0),
    ("Poultry", 35.0),
    ("Dairy", 15.0),
    ("Beverages", 12.0),
    ("Cooking Oils", 45.0),
    ("Vegetables", 10.0),
    ("Fruits", 18.0),
    ("Instant Food", 8.0),
    ("Condiments", 12.0),
    ("Spreads", 28.0),
    ("Breakfast", 22.0),
    ("Eggs", 20.0),
    ("Frozen Foods", 25.0),
    ("Household", 35.0),
    ("Personal Care", 20.0),
    ("Baby Care", 45.0),
    ("Meat", 55.0),
    ("Seafood", 65.0),
    ("Spices", 40.0),
    ("Deli", 18.0),
    ("Sweets", 35.0),
];

const ITEMS: [(&str, &str); 50] = [
    ("Basmati Rice 5kg", "Rice & Grains"),
    ("Brown Rice 2kg", "Rice & Grains"),
    ("Rolled Oats 1kg", "Rice & Grains"),
    ("Arabic Bread Pack", "Bakery"),
    ("Whole Wheat Loaf", "Bakery"),
    ("Butter Croissants 6pk", "Bakery"),
    ("Whole Chicken 1kg", "Poultry"),
    ("Chicken Breast 500g", "Poultry"),
    ("Fresh Milk 2L", "Dairy"),
    ("Laban 1L", "Dairy"),
    ("Greek Yoghurt 500g", "Dairy"),
    ("Cheddar Slices 200g", "Dairy"),
    ("Mineral Water 12pk", "Beverages"),
    ("Orange Juice 1L", "Beverages"),
    ("Karak Tea Mix", "Beverages"),
    ("Sunflower Oil 1.8L", "Cooking Oils"),
    ("Olive Oil 1L", "Cooking Oils"),
    ("Tomatoes 1kg", "Vegetables"),
    ("Onions 2kg", "Vegetables"),
    ("Cucumbers 1kg", "Vegetables"),
    ("Bananas 1kg", "Fruits"),
    ("Medjool Dates 500g", "Fruits"),
    ("Royal Gala Apples 1kg", "Fruits"),
    ("Instant Noodles 5pk", "Instant Food"),
    ("Cup Soup 4pk", "Instant Food"),
    ("Tomato Ketchup 500g", "Condiments"),
    ("Tahini 450g", "Condiments"),
    ("Hazelnut Spread 400g", "Spreads"),
    ("Peanut Butter 340g", "Spreads"),
    ("Corn Flakes 500g", "Breakfast"),
    ("Honey 500g", "Breakfast"),
    ("Free Range Eggs 30pk", "Eggs"),
    ("Brown Eggs 15pk", "Eggs"),
    ("Frozen Peas 900g", "Frozen Foods"),
    ("Frozen Paratha 20pk", "Frozen Foods"),
    ("Dishwashing Liquid 1L", "Household"),
    ("Laundry Detergent 3kg", "Household"),
    ("Shampoo 400ml", "Personal Care"),
    ("Toothpaste 2pk", "Personal Care"),
    ("Baby Diapers 40pk", "Baby Care"),
    ("Infant Formula 900g", "Baby Care"),
    ("Lamb Chops 1kg", "Meat"),
    ("Beef Mince 500g", "Meat"),
    ("Hammour Fillet 1kg", "Seafood"),
    ("King Prawns 500g", "Seafood"),
    ("Saffron 2g", "Spices"),
    ("Cardamom 100g", "Spices"),
    ("Hummus 250g", "Deli"),
    ("Baklava Box 500g", "Sweets"),
    ("Maamoul Assorted 400g", "Sweets"),
];

/// A catalogue item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSeed {
    /// Stable item identifier, starting at 1.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Category name, matching [`CATEGORY_UNIT_COSTS`].
    pub category: String,
    /// Purchase cost per unit in AED.
    pub unit_cost: f64,
    /// Shelf price per unit in AED.
    pub unit_price: f64,
}

/// Look up the unit cost for a category, falling back to [`DEFAULT_UNIT_COST`].
///
/// # Example
///
/// ```
/// use mock_data::{DEFAULT_UNIT_COST, unit_cost_for};
///
/// assert_eq!(unit_cost_for("Dairy"), 15.0);
/// assert_eq!(unit_cost_for("Garden"), DEFAULT_UNIT_COST);
/// ```
#[must_use]
pub fn unit_cost_for(category: &str) -> f64 {
    CATEGORY_UNIT_COSTS
        .iter()
        .find(|(name, _)| *name == category)
        .map_or(DEFAULT_UNIT_COST, |(_, cost)| *cost)
}

/// Build the full item catalogue. Identifiers are contiguous from 1.
#[must_use]
pub fn catalogue() -> Vec<ItemSeed> {
    ITEMS
        .iter()
        .zip(1_u32..)
        .map(|((name, category), id)| {
            let unit_cost = unit_cost_for(category);
            ItemSeed {
                id,
                name: (*name).to_owned(),
                category: (*category).to_owned(),
                unit_cost,
                unit_price: round_cents(unit_cost * RETAIL_MARKUP),
            }
        })
        .collect()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_item_category_has_a_cost() {
        for item in catalogue() {
            assert!(
                CATEGORY_UNIT_COSTS
                    .iter()
                    .any(|(name, _)| *name == item.category),
                "missing cost for {}",
                item.category
            );
        }
    }

    #[test]
    fn shelf_price_exceeds_cost() {
        for item in catalogue() {
            assert!(item.unit_price > item.unit_cost);
        }
    }

    #[test]
    fn catalogue_has_fifty_items() {
        let items = catalogue();
        assert_eq!(items.len(), 50);
        assert_eq!(items.first().map(|item| item.id), Some(1));
        assert_eq!(items.last().map(|item| item.id), Some(50));
    }
}
