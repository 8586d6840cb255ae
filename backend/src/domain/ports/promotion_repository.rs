//! Port for promotion storage.

use async_trait::async_trait;

use crate::domain::{Promotion, PromotionId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by promotion repositories.
    pub enum PromotionRepositoryError {
        /// Storage could not be reached.
        Unavailable { message: String } => "promotion repository unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromotionRepository: Send + Sync {
    async fn next_id(&self) -> Result<PromotionId, PromotionRepositoryError>;

    /// Insert or replace a promotion.
    async fn save(&self, promotion: &Promotion) -> Result<(), PromotionRepositoryError>;

    async fn find(&self, id: PromotionId) -> Result<Option<Promotion>, PromotionRepositoryError>;

    async fn list(&self) -> Result<Vec<Promotion>, PromotionRepositoryError>;
}
