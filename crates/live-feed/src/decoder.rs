//! Incremental `text/event-stream` parser.
//!
//! Bytes arrive in arbitrary chunks, so the decoder buffers partial lines and
//! only emits a frame once its terminating blank line has been seen.

use serde::de::DeserializeOwned;

use crate::error::FeedError;

const DEFAULT_EVENT: &str = "message";

/// One dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event name, `message` when the server sent none.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
    /// Identifier carried by this frame, if any.
    pub id: Option<String>,
    /// Reconnect hint in milliseconds, if any.
    pub retry: Option<u64>,
}

impl SseFrame {
    /// Frame with the given event name and payload.
    #[must_use]
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
            retry: None,
        }
    }

    /// Attach an identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Numeric form of the identifier when it is an unsigned integer.
    #[must_use]
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.as_deref().and_then(|id| id.trim().parse().ok())
    }

    /// Decode the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Payload`] when the data is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FeedError> {
        serde_json::from_str(&self.data).map_err(|err| FeedError::Payload {
            message: err.to_string(),
        })
    }
}

/// Stateful decoder turning byte chunks into frames.
///
/// # Example
///
/// ```
/// use live_feed::SseDecoder;
///
/// let mut decoder = SseDecoder::default();
/// assert!(decoder.push(b"event: sales\ndata: {\"units\"").is_empty());
/// let frames = decoder.push(b":3}\nid: 7\n\n");
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].event, "sales");
/// assert_eq!(frames[0].data, "{\"units\":3}");
/// assert_eq!(frames[0].numeric_id(), Some(7));
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    retry: Option<u64>,
}

impl SseDecoder {
    /// Feed a chunk and collect every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let text = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&text) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, rest)) => (field, rest.strip_prefix(' ').unwrap_or(rest)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => self.data.push(value.to_owned()),
            "id" => self.id = Some(value.to_owned()),
            "retry" => self.retry = value.parse().ok(),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        let id = self.id.take();
        let retry = self.retry.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event.unwrap_or_else(|| DEFAULT_EVENT.to_owned()),
            data,
            id,
            retry,
        })
    }
}
