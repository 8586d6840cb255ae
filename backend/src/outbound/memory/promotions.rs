//! Promotions kept in process memory.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{PromotionRepository, PromotionRepositoryError};
use crate::domain::{Promotion, PromotionId};

/// Promotions keyed by id, seeded with the demo campaigns.
#[derive(Debug, Default)]
pub struct MemoryPromotionRepository {
    promotions: RwLock<BTreeMap<PromotionId, Promotion>>,
    sequence: AtomicU64,
}

impl MemoryPromotionRepository {
    /// New ids continue after the highest seeded id.
    pub fn new(seed: Vec<Promotion>) -> Self {
        let highest = seed.iter().map(|promotion| promotion.id.0).max().unwrap_or(0);
        Self {
            promotions: RwLock::new(seed.into_iter().map(|p| (p.id, p)).collect()),
            sequence: AtomicU64::new(highest),
        }
    }
}

#[async_trait]
impl PromotionRepository for MemoryPromotionRepository {
    async fn next_id(&self) -> Result<PromotionId, PromotionRepositoryError> {
        Ok(PromotionId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn save(&self, promotion: &Promotion) -> Result<(), PromotionRepositoryError> {
        self.promotions
            .write()
            .await
            .insert(promotion.id, promotion.clone());
        Ok(())
    }

    async fn find(&self, id: PromotionId) -> Result<Option<Promotion>, PromotionRepositoryError> {
        Ok(self.promotions.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Promotion>, PromotionRepositoryError> {
        Ok(self.promotions.read().await.values().cloned().collect())
    }
}
