//! Service configuration loaded via OrthoConfig.
//!
//! Every field can come from a `--flag`, a `RETAIL_*` environment variable or
//! the configuration file; unset fields resolve to the defaults below.

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STREAM_INTERVAL_SECS: u64 = 5;
const DEFAULT_ALERT_SCAN_EVERY: u32 = 12;
const DEFAULT_MOCK_SEED: u64 = 42;
const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Runtime settings for the retail operations service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RETAIL")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Seconds between generated live sales. Zero disables the generator.
    pub stream_interval_secs: Option<u64>,
    /// Run alert detection every this many generated sales.
    pub alert_scan_every: Option<u32>,
    /// Seed of the demo dataset and the sale generator.
    pub mock_seed: Option<u64>,
    /// Redis URL for the shared read-model cache. In-process when unset.
    pub redis_url: Option<String>,
    /// Lifetime of cached read models.
    pub cache_ttl_secs: Option<u64>,
    /// Session key file; falls back to `RETAIL_SESSION_KEY_FILE` handling.
    pub session_key_file: Option<PathBuf>,
    /// Force the `Secure` cookie attribute on or off.
    pub cookie_secure: Option<bool>,
}

impl AppSettings {
    /// Parsed listen address.
    ///
    /// # Errors
    /// Returns the parse error when the configured value is not `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR).parse()
    }

    /// Generator pacing, or `None` when the generator is switched off.
    #[must_use]
    pub fn stream_interval(&self) -> Option<Duration> {
        match self.stream_interval_secs.unwrap_or(DEFAULT_STREAM_INTERVAL_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    #[must_use]
    pub fn alert_scan_every(&self) -> u32 {
        self.alert_scan_every.unwrap_or(DEFAULT_ALERT_SCAN_EVERY)
    }

    #[must_use]
    pub fn mock_seed(&self) -> u64 {
        self.mock_seed.unwrap_or(DEFAULT_MOCK_SEED)
    }

    /// Redis URL, ignoring blank values.
    #[must_use]
    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }
}
