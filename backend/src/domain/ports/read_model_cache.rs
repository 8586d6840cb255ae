//! Port for caching derived read models such as summaries and trends.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{CacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by cache adapters. Callers treat them as misses.
    pub enum ReadModelCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "read model cache backend failure: {message}",
        /// Stored content could not be decoded.
        Serialization { message: String } => "read model cache serialisation failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadModelCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, ReadModelCacheError>;

    /// Store `value` for roughly `ttl`; adapters may add jitter.
    async fn put(&self, key: &CacheKey, value: &Value, ttl: Duration)
    -> Result<(), ReadModelCacheError>;
}
