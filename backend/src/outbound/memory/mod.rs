//! In-memory repositories seeded from the generated demo dataset.
//!
//! State lives behind `tokio` locks for the lifetime of the process. Each
//! adapter keeps its own sequence for new identifiers.

mod alerts;
mod catalogue;
mod inventory;
mod notifications;
mod orders;
mod promotions;
mod sales_history;
mod seed;
mod staff_directory;

pub use alerts::MemoryAlertRepository;
pub use catalogue::MemoryCatalogue;
pub use inventory::MemoryInventoryRepository;
pub use notifications::MemoryNotificationRepository;
pub use orders::MemoryOrderRepository;
pub use promotions::MemoryPromotionRepository;
pub use sales_history::{LIVE_BUFFER_CAPACITY, MemorySalesHistory};
pub use seed::{DEMO_HISTORY_DAYS, DemoData};
pub use staff_directory::MemoryStaffDirectory;
