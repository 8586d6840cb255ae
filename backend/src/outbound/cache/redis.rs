//! Redis-backed read-model cache.
//!
//! Values are stored as JSON strings under the fingerprinted key with
//! `SET .. EX`, so Redis handles expiry.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::redis::AsyncCommands;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::Value;

use super::jittered;
use crate::domain::ports::{CacheKey, ReadModelCache, ReadModelCacheError};

/// Connection settings for [`RedisReadModelCache`].
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl RedisCacheConfig {
    /// Defaults: 8 connections, 2 second checkout timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: 8,
            connection_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Read-model cache shared between instances through Redis.
pub struct RedisReadModelCache {
    pool: Pool<RedisConnectionManager>,
    rng: Mutex<SmallRng>,
}

impl RedisReadModelCache {
    /// Build the pool. Connections are opened lazily on first use.
    pub async fn connect(config: &RedisCacheConfig) -> Result<Self, ReadModelCacheError> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|err| ReadModelCacheError::backend(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| ReadModelCacheError::backend(err.to_string()))?;
        Ok(Self {
            pool,
            rng: Mutex::new(SmallRng::from_entropy()),
        })
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, ReadModelCacheError> {
        self.pool
            .get()
            .await
            .map_err(|err| ReadModelCacheError::backend(format!("checkout failed: {err}")))
    }

    fn expiry(&self, ttl: Duration) -> u64 {
        let ttl = match self.rng.lock() {
            Ok(mut rng) => jittered(ttl, &mut *rng),
            Err(_) => ttl,
        };
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl ReadModelCache for RedisReadModelCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, ReadModelCacheError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(key.as_str())
            .await
            .map_err(|err| ReadModelCacheError::backend(err.to_string()))?;
        raw.map(|text| {
            serde_json::from_str(&text)
                .map_err(|err| ReadModelCacheError::serialization(err.to_string()))
        })
        .transpose()
    }

    async fn put(
        &self,
        key: &CacheKey,
        value: &Value,
        ttl: Duration,
    ) -> Result<(), ReadModelCacheError> {
        let text = serde_json::to_string(value)
            .map_err(|err| ReadModelCacheError::serialization(err.to_string()))?;
        let seconds = self.expiry(ttl);
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key.as_str(), text, seconds)
            .await
            .map_err(|err| ReadModelCacheError::backend(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builders_override_defaults() {
        let config = RedisCacheConfig::new("redis://127.0.0.1:6379")
            .with_max_size(2)
            .with_connection_timeout(Duration::from_millis(250));
        assert_eq!(config.max_size, 2);
        assert_eq!(config.connection_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn malformed_url_is_a_backend_error() {
        let err = RedisReadModelCache::connect(&RedisCacheConfig::new("not a url"))
            .await
            .err()
            .expect("rejected");
        assert!(matches!(err, ReadModelCacheError::Backend { .. }));
    }
}
