//! Cache-aside helper for derived read models.
//!
//! Cache failures never fail a request: a broken or unreachable cache is
//! logged and the value is computed from the repositories instead.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::Error;
use super::ports::{CacheKey, ReadModelCache};

/// Shared handle used by services that cache summaries.
#[derive(Clone)]
pub struct ReadModels {
    cache: Arc<dyn ReadModelCache>,
    ttl: Duration,
}

impl ReadModels {
    pub fn new(cache: Arc<dyn ReadModelCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Return the cached value for `namespace` + `params`, computing and
    /// storing it on a miss.
    pub async fn get_or_compute<T, P, F, Fut>(
        &self,
        namespace: &str,
        params: &P,
        compute: F,
    ) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let key = match CacheKey::fingerprint(namespace, params) {
            Ok(key) => key,
            Err(err) => {
                warn!(namespace, error = %err, "read model key rejected; bypassing cache");
                return compute().await;
            }
        };
        match self.cache.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(hit) => {
                    debug!(key = %key, "read model cache hit");
                    return Ok(hit);
                }
                Err(err) => warn!(key = %key, error = %err, "discarding undecodable cache entry"),
            },
            Ok(None) => {}
            Err(err) => warn!(key = %key, error = %err, "read model cache lookup failed"),
        }
        let value = compute().await?;
        match serde_json::to_value(&value) {
            Ok(json) => {
                if let Err(err) = self.cache.put(&key, &json, self.ttl).await {
                    warn!(key = %key, error = %err, "read model cache write failed");
                }
            }
            Err(err) => warn!(key = %key, error = %err, "read model not serialisable"),
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockReadModelCache, ReadModelCacheError};
    use rstest::rstest;
    use serde_json::json;

    fn models(cache: MockReadModelCache) -> ReadModels {
        ReadModels::new(Arc::new(cache), Duration::from_secs(30))
    }

    #[rstest]
    #[tokio::test]
    async fn hit_skips_computation() {
        let mut cache = MockReadModelCache::new();
        cache.expect_get().returning(|_| Ok(Some(json!(7))));
        cache.expect_put().never();
        let value: u32 = models(cache)
            .get_or_compute("n", &json!({}), || async { Err(Error::internal("computed on hit")) })
            .await
            .expect("hit");
        assert_eq!(value, 7);
    }

    #[rstest]
    #[tokio::test]
    async fn miss_computes_and_stores() {
        let mut cache = MockReadModelCache::new();
        cache.expect_get().returning(|_| Ok(None));
        cache
            .expect_put()
            .withf(|_, value, ttl| value == &json!(3) && *ttl == Duration::from_secs(30))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let value: u32 = models(cache)
            .get_or_compute("n", &json!({ "a": 1 }), || async { Ok(3) })
            .await
            .expect("computed");
        assert_eq!(value, 3);
    }

    #[rstest]
    #[tokio::test]
    async fn backend_failures_fall_through_to_computation() {
        let mut cache = MockReadModelCache::new();
        cache
            .expect_get()
            .returning(|_| Err(ReadModelCacheError::backend("down")));
        cache
            .expect_put()
            .returning(|_, _, _| Err(ReadModelCacheError::backend("down")));
        let value: String = models(cache)
            .get_or_compute("n", "k", || async { Ok("fresh".to_owned()) })
            .await
            .expect("computed");
        assert_eq!(value, "fresh");
    }
}
