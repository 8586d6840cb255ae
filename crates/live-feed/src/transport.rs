//! Connection seam between the subscription loop and the network.

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, COOKIE};

use crate::config::FeedConfig;
use crate::error::FeedError;

const EVENT_STREAM: &str = "text/event-stream";
const LAST_EVENT_ID: &str = "Last-Event-ID";

/// Body chunks of an open feed.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, FeedError>>;

/// Opens a feed connection.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// Connect, resuming after `last_event_id` when provided.
    async fn open(&self, last_event_id: Option<&str>) -> Result<ByteStream, FeedError>;
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
    cookie: Option<String>,
}

impl HttpTransport {
    /// Build a transport for the configured URL.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|err| FeedError::Client {
                message: err.to_string(),
            })?;
        Ok(Self {
            client,
            url: config.url().to_owned(),
            cookie: None,
        })
    }

    /// Send `cookie` (for example `session=...`) with every connection.
    #[must_use]
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn open(&self, last_event_id: Option<&str>) -> Result<ByteStream, FeedError> {
        let mut request = self
            .client
            .get(&self.url)
            .header(ACCEPT, EVENT_STREAM)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id {
            request = request.header(LAST_EVENT_ID, id);
        }
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie.as_str());
        }
        let response = request.send().await.map_err(|err| FeedError::Connect {
            message: err.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !content_type.starts_with(EVENT_STREAM) {
            return Err(FeedError::ContentType {
                found: content_type,
            });
        }
        let body = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|err| FeedError::Stream {
                    message: err.to_string(),
                })
        });
        Ok(body.boxed())
    }
}
