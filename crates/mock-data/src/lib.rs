//! Deterministic retail fixtures for demonstration and fallback purposes.
//!
//! This crate generates believable, reproducible supermarket data: stores,
//! catalogue items, staff members, daily sales history and a handful of
//! promotions. The same seed always yields the same dataset, so callers can
//! substitute it for a failing or empty source without the output flickering
//! between requests.
//!
//! The crate is independent of backend domain types. Callers convert the seed
//! records into their own types at the point of use.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use mock_data::{DatasetOptions, generate_dataset};
//!
//! let anchor = NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date");
//! let options = DatasetOptions::new(42, anchor).with_history_days(14);
//! let dataset = generate_dataset(&options).expect("generation succeeds");
//!
//! assert_eq!(dataset.stores.len(), 10);
//! assert_eq!(dataset, generate_dataset(&options).expect("generation succeeds"));
//! ```

mod catalogue;
mod dataset;
mod error;
mod promotions;
mod sales;
mod staff;
mod stores;

pub use catalogue::{CATEGORY_UNIT_COSTS, DEFAULT_UNIT_COST, ItemSeed, catalogue, unit_cost_for};
pub use dataset::{DatasetOptions, MockDataset, generate_dataset};
pub use error::GenerationError;
pub use promotions::{DiscountKindSeed, PromotionSeed};
pub use sales::{DailySalesSeed, SaleTick, SaleTicker, seasonality_factor};
pub use staff::{DEMO_PASSWORD, StaffSeed};
pub use stores::{STORES, StoreSeed};
