//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod alert_repository;
mod cache_key;
mod inventory_repository;
mod live_event_bus;
mod notification_repository;
mod order_repository;
mod promotion_repository;
mod read_model_cache;
mod sales_history;
mod staff_directory;
mod store_catalogue;

#[cfg(test)]
pub use alert_repository::MockAlertRepository;
pub use alert_repository::{AlertRepository, AlertRepositoryError};
pub use cache_key::{CacheKey, CacheKeyValidationError};
#[cfg(test)]
pub use inventory_repository::MockInventoryRepository;
pub use inventory_repository::{InventoryRepository, InventoryRepositoryError};
#[cfg(test)]
pub use live_event_bus::MockLiveEventBus;
pub use live_event_bus::{LiveEventBus, LiveEventStream};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{OrderRepository, OrderRepositoryError};
#[cfg(test)]
pub use promotion_repository::MockPromotionRepository;
pub use promotion_repository::{PromotionRepository, PromotionRepositoryError};
#[cfg(test)]
pub use read_model_cache::MockReadModelCache;
pub use read_model_cache::{ReadModelCache, ReadModelCacheError};
#[cfg(test)]
pub use sales_history::MockSalesHistory;
pub use sales_history::{SalesHistory, SalesHistoryError};
#[cfg(test)]
pub use staff_directory::MockStaffDirectory;
pub use staff_directory::{StaffDirectory, StaffDirectoryError};
#[cfg(test)]
pub use store_catalogue::MockStoreCatalogue;
pub use store_catalogue::{StoreCatalogue, StoreCatalogueError};
