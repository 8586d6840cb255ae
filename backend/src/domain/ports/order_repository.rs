//! Port for procurement order storage.

use async_trait::async_trait;

use crate::domain::{OrderId, ProcurementOrder};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repositories.
    pub enum OrderRepositoryError {
        /// Storage could not be reached.
        Unavailable { message: String } => "order repository unavailable: {message}",
    }
}

/// Durable storage of procurement orders.
///
/// Callers serialise read-modify-write sequences themselves; `save` simply
/// replaces the stored order with the same id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Reserve the next sequential order id.
    async fn next_id(&self) -> Result<OrderId, OrderRepositoryError>;

    /// Insert or replace an order.
    async fn save(&self, order: &ProcurementOrder) -> Result<(), OrderRepositoryError>;

    async fn find(&self, id: OrderId) -> Result<Option<ProcurementOrder>, OrderRepositoryError>;

    /// Every order in insertion order.
    async fn list(&self) -> Result<Vec<ProcurementOrder>, OrderRepositoryError>;
}
