//! In-process read-model cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::Value;

use super::jittered;
use crate::domain::ports::{CacheKey, ReadModelCache, ReadModelCacheError};

struct Entry {
    value: Value,
    expires_at: Instant,
}

struct State {
    entries: HashMap<String, Entry>,
    rng: SmallRng,
}

/// Map of cached read models. Expired entries are dropped when read.
pub struct MemoryReadModelCache {
    state: Mutex<State>,
}

impl MemoryReadModelCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                entries: HashMap::new(),
                rng: SmallRng::from_entropy(),
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, ReadModelCacheError> {
        self.state
            .lock()
            .map_err(|_| ReadModelCacheError::backend("cache mutex poisoned"))
    }
}

impl Default for MemoryReadModelCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadModelCache for MemoryReadModelCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, ReadModelCacheError> {
        let mut state = self.lock()?;
        let now = Instant::now();
        match state.entries.get(key.as_str()) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                state.entries.remove(key.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &CacheKey,
        value: &Value,
        ttl: Duration,
    ) -> Result<(), ReadModelCacheError> {
        let mut state = self.lock()?;
        let ttl = jittered(ttl, &mut state.rng);
        state.entries.insert(
            key.as_str().to_owned(),
            Entry {
                value: value.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> CacheKey {
        CacheKey::new("inventory-summary:v1:abc").expect("key")
    }

    #[tokio::test]
    async fn returns_fresh_entries() {
        let cache = MemoryReadModelCache::new();
        cache
            .put(&key(), &json!({ "total_items": 4 }), Duration::from_secs(60))
            .await
            .expect("put");
        let hit = cache.get(&key()).await.expect("get");
        assert_eq!(hit, Some(json!({ "total_items": 4 })));
    }

    #[tokio::test]
    async fn drops_expired_entries() {
        let cache = MemoryReadModelCache::new();
        cache
            .put(&key(), &json!(1), Duration::ZERO)
            .await
            .expect("put");
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get(&key()).await.expect("get"), None);
    }
}
