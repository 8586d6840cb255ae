//! Stores and the items they stock.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::staff::{ItemId, StoreId};

/// Currency every monetary figure is reported in.
pub const CURRENCY: &str = "AED";

/// A store in the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Store {
    #[schema(example = 1)]
    pub id: StoreId,
    #[schema(example = "Al Barsha Hypermarket")]
    pub name: String,
    #[schema(example = "Dubai")]
    pub city: String,
    pub region_id: u32,
}

/// A catalogue item with its cost and shelf price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CatalogueItem {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub unit_cost: f64,
    pub unit_price: f64,
}

/// Round a monetary amount to two decimal places.
///
/// # Examples
/// ```
/// use retail_backend::domain::round2;
///
/// assert_eq!(round2(12.345_6), 12.35);
/// ```
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
