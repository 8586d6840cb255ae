//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use retail_backend::outbound::feed::FeedSettings;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) mock_seed: u64,
    pub(crate) redis_url: Option<String>,
    pub(crate) cache_ttl: Duration,
    pub(crate) feed: Option<FeedSettings>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Session and binding settings; everything else starts at its default
    /// (seed 42, in-process cache with a 30 second TTL, default feed pacing).
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            mock_seed: 42,
            redis_url: None,
            cache_ttl: Duration::from_secs(30),
            feed: Some(FeedSettings::default()),
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Seed for the demo dataset and the live sale generator.
    #[must_use]
    pub fn with_mock_seed(mut self, seed: u64) -> Self {
        self.mock_seed = seed;
        self
    }

    /// Share read models through Redis at `url` when given.
    #[must_use]
    pub fn with_cache(mut self, redis_url: Option<String>, ttl: Duration) -> Self {
        self.redis_url = redis_url;
        self.cache_ttl = ttl;
        self
    }

    /// Pace the live sale generator, or switch it off with `None`.
    #[must_use]
    pub fn with_feed(mut self, feed: Option<FeedSettings>) -> Self {
        self.feed = feed;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
