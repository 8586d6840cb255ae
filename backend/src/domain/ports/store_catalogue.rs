//! Port exposing stores and catalogue items.

use async_trait::async_trait;

use crate::domain::{CatalogueItem, ItemId, Store, StoreId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalogue adapters.
    pub enum StoreCatalogueError {
        /// The backing source could not be read.
        Unavailable { message: String } => "store catalogue unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreCatalogue: Send + Sync {
    /// All stores, ordered by id.
    async fn stores(&self) -> Result<Vec<Store>, StoreCatalogueError>;

    /// All catalogue items, ordered by id.
    async fn items(&self) -> Result<Vec<CatalogueItem>, StoreCatalogueError>;

    /// Look up one store.
    async fn store(&self, id: StoreId) -> Result<Option<Store>, StoreCatalogueError> {
        Ok(self.stores().await?.into_iter().find(|store| store.id == id))
    }

    /// Look up one item.
    async fn item(&self, id: ItemId) -> Result<Option<CatalogueItem>, StoreCatalogueError> {
        Ok(self.items().await?.into_iter().find(|item| item.id == id))
    }
}
