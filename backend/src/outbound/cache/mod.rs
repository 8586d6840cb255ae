//! Read-model cache adapters.
//!
//! - [`MemoryReadModelCache`]: per-process map with expiry, the default.
//! - [`RedisReadModelCache`]: shared cache behind a `bb8-redis` pool, used
//!   when a Redis URL is configured.
//!
//! Both stretch each TTL by up to [`MAX_JITTER_PERCENT`] so entries written
//! together do not all expire together.

mod memory;
mod redis;

use std::time::Duration;

use rand::Rng;

pub use memory::MemoryReadModelCache;
pub use redis::{RedisCacheConfig, RedisReadModelCache};

/// Upper bound of the random TTL extension, as a percentage.
pub const MAX_JITTER_PERCENT: u64 = 10;

/// `ttl` plus a random extension of up to [`MAX_JITTER_PERCENT`].
pub(crate) fn jittered<R: Rng + ?Sized>(ttl: Duration, rng: &mut R) -> Duration {
    let ceiling = ttl.as_millis().saturating_mul(u128::from(MAX_JITTER_PERCENT)) / 100;
    let ceiling = u64::try_from(ceiling).unwrap_or(u64::MAX);
    if ceiling == 0 {
        return ttl;
    }
    ttl.saturating_add(Duration::from_millis(rng.gen_range(0..=ceiling)))
}
