//! Subscription settings.

use std::time::Duration;

/// Delay between a dropped connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on establishing the TCP/TLS connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for one feed subscription.
///
/// The reconnect delay is fixed: it never grows between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    url: String,
    reconnect_delay: Duration,
    connect_timeout: Duration,
}

impl FeedConfig {
    /// Settings for `url` with default delays.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the reconnect delay.
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Override the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Channel URL.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Delay before reconnecting.
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}
