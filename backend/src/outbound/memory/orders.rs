//! Procurement orders kept in process memory.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{OrderId, ProcurementOrder};

/// Orders keyed by id. Ids start at 1.
#[derive(Debug, Default)]
pub struct MemoryOrderRepository {
    orders: RwLock<BTreeMap<OrderId, ProcurementOrder>>,
    sequence: AtomicU64,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn next_id(&self) -> Result<OrderId, OrderRepositoryError> {
        Ok(OrderId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn save(&self, order: &ProcurementOrder) -> Result<(), OrderRepositoryError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn find(&self, id: OrderId) -> Result<Option<ProcurementOrder>, OrderRepositoryError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<ProcurementOrder>, OrderRepositoryError> {
        Ok(self.orders.read().await.values().cloned().collect())
    }
}
