//! Fixed store directory shared by every dataset.

use serde::Serialize;

/// A store record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSeed {
    /// Stable store identifier, starting at 1.
    pub id: u32,
    /// Display name.
    pub name: &'static str,
    /// City the store trades in.
    pub city: &'static str,
    /// Region grouping used for regional managers.
    pub region_id: u32,
}

/// The store directory. Identifiers are contiguous from 1.
pub const STORES: [StoreSeed; 10] = [
    store(1, "Al Barsha Hypermarket", "Dubai", 1),
    store(2, "Deira City Centre Hypermarket", "Dubai", 1),
    store(3, "Karama Hypermarket", "Dubai", 1),
    store(4, "Mushrif Mall Hypermarket", "Abu Dhabi", 2),
    store(5, "Al Wahda Hypermarket", "Abu Dhabi", 2),
    store(6, "Khalidiyah Hypermarket", "Abu Dhabi", 2),
    store(7, "Sharjah City Centre Hypermarket", "Sharjah", 3),
    store(8, "Al Nahda Hypermarket", "Sharjah", 3),
    store(9, "Ajman Hypermarket", "Ajman", 3),
    store(10, "Ras Al Khaimah Hypermarket", "Ras Al Khaimah", 3),
];

const fn store(id: u32, name: &'static str, city: &'static str, region_id: u32) -> StoreSeed {
    StoreSeed {
        id,
        name,
        city,
        region_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_ids_are_contiguous_from_one() {
        for (index, seed) in STORES.iter().enumerate() {
            assert_eq!(seed.id as usize, index + 1);
        }
    }

    #[test]
    fn every_region_has_stores() {
        for region in 1..=3 {
            assert!(STORES.iter().any(|seed| seed.region_id == region));
        }
    }
}
