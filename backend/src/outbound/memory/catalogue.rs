//! Fixed store directory and product catalogue.

use async_trait::async_trait;

use crate::domain::ports::{StoreCatalogue, StoreCatalogueError};
use crate::domain::{CatalogueItem, Store};

/// Catalogue held in memory, sorted by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogue {
    stores: Vec<Store>,
    items: Vec<CatalogueItem>,
}

impl MemoryCatalogue {
    pub fn new(mut stores: Vec<Store>, mut items: Vec<CatalogueItem>) -> Self {
        stores.sort_by_key(|store| store.id);
        items.sort_by_key(|item| item.id);
        Self { stores, items }
    }
}

#[async_trait]
impl StoreCatalogue for MemoryCatalogue {
    async fn stores(&self) -> Result<Vec<Store>, StoreCatalogueError> {
        Ok(self.stores.clone())
    }

    async fn items(&self) -> Result<Vec<CatalogueItem>, StoreCatalogueError> {
        Ok(self.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{item, store};

    #[tokio::test]
    async fn lookups_find_by_id() {
        let catalogue = MemoryCatalogue::new(vec![store(2), store(1)], vec![item(5, "Dairy")]);
        let stores = catalogue.stores().await.expect("stores");
        assert_eq!(stores.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(catalogue.store(2).await.expect("lookup"), Some(store(2)));
        assert_eq!(catalogue.item(6).await.expect("lookup"), None);
    }
}
