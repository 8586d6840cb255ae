//! Error types for feed subscriptions.

use thiserror::Error;

/// Failures raised while opening or reading a feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The HTTP client could not be built.
    #[error("failed to build feed client: {message}")]
    Client {
        /// Underlying client error.
        message: String,
    },

    /// The connection could not be established.
    #[error("failed to connect to feed: {message}")]
    Connect {
        /// Underlying transport error.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("feed responded with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The server answered with something other than an event stream.
    #[error("feed responded with content type '{found}', expected text/event-stream")]
    ContentType {
        /// Content type the server sent.
        found: String,
    },

    /// Reading the body failed mid-stream.
    #[error("feed stream interrupted: {message}")]
    Stream {
        /// Underlying read error.
        message: String,
    },

    /// A frame payload could not be decoded as JSON.
    #[error("failed to decode frame payload: {message}")]
    Payload {
        /// Underlying decode error.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(FeedError::Status { status: 503 }, "feed responded with status 503")]
    #[case(
        FeedError::ContentType { found: "text/html".to_owned() },
        "feed responded with content type 'text/html', expected text/event-stream"
    )]
    #[case(
        FeedError::Connect { message: "refused".to_owned() },
        "failed to connect to feed: refused"
    )]
    fn errors_render_readable_messages(#[case] error: FeedError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
