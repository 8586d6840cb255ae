//! Reconnecting Server-Sent Events subscription client.
//!
//! Dashboards subscribe to long-lived `text/event-stream` channels such as
//! `/stream/sales` and `/stream/alerts`. Every consumer needs the same
//! behaviour: parse frames incrementally, reconnect after a fixed delay when
//! the connection drops, resume with `Last-Event-ID`, skip frames it has
//! already seen, and optionally substitute mock frames while offline. This
//! crate implements that behaviour once.
//!
//! # Example
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use live_feed::{FeedConfig, FeedEvent, HttpTransport, subscribe};
//!
//! # async fn run() -> Result<(), live_feed::FeedError> {
//! let config = FeedConfig::new("http://localhost:8080/stream/sales");
//! let transport = HttpTransport::new(&config)?;
//! let mut feed = Box::pin(subscribe(transport, config));
//! while let Some(event) = feed.next().await {
//!     if let FeedEvent::Message(frame) = event {
//!         println!("{}: {}", frame.event, frame.data);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod decoder;
mod error;
mod fallback;
mod subscription;
mod transport;

pub use config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_RECONNECT_DELAY, FeedConfig};
pub use decoder::{SseDecoder, SseFrame};
pub use error::FeedError;
pub use fallback::with_fallback;
pub use subscription::{FeedEvent, subscribe};
pub use transport::{ByteStream, FeedTransport, HttpTransport};
