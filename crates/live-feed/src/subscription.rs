//! Reconnecting subscription loop.
//!
//! The loop is a small state machine driven by `stream::unfold`: connect,
//! read frames until the body ends or errors, wait the fixed reconnect delay,
//! then connect again with the last seen event id. Frames whose numeric id is
//! not newer than the last delivered one are dropped so replays after a
//! reconnect are invisible to consumers. A `connected` greeting opens a new
//! server session whose ids may start over, so it clears the watermark.
//! Dropping the stream ends the subscription.

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::decoder::{SseDecoder, SseFrame};
use crate::transport::{ByteStream, FeedTransport};

/// Event name the server greets each new connection with.
const GREETING_EVENT: &str = "connected";

/// Items yielded by a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// A connection was established.
    Connected,
    /// A frame arrived from the server.
    Message(SseFrame),
    /// The connection failed or ended; a reconnect follows after the delay.
    Disconnected {
        /// Human-readable cause.
        reason: String,
    },
    /// A locally generated frame substituted while disconnected.
    Fallback(SseFrame),
}

enum Phase {
    Connecting,
    Streaming(ByteStream, SseDecoder),
    Waiting,
}

struct State<T> {
    transport: Arc<T>,
    config: FeedConfig,
    phase: Phase,
    pending: VecDeque<FeedEvent>,
    last_id: Option<String>,
    last_numeric_id: Option<u64>,
}

impl<T> State<T> {
    fn accept(&mut self, frame: SseFrame) {
        if frame.event == GREETING_EVENT && self.last_numeric_id.take().is_some() {
            debug!("feed session restarted, resetting event ids");
        }
        if let Some(numeric) = frame.numeric_id() {
            if self.last_numeric_id.is_some_and(|seen| numeric <= seen) {
                debug!(id = numeric, "dropping replayed frame");
                return;
            }
            self.last_numeric_id = Some(numeric);
        }
        if let Some(id) = &frame.id {
            self.last_id = Some(id.clone());
        }
        self.pending.push_back(FeedEvent::Message(frame));
    }
}

/// Subscribe to a feed through `transport`.
///
/// The returned stream never ends on its own; drop it to unsubscribe.
pub fn subscribe<T>(transport: T, config: FeedConfig) -> impl Stream<Item = FeedEvent> + Send
where
    T: FeedTransport + 'static,
{
    let state = State {
        transport: Arc::new(transport),
        config,
        phase: Phase::Connecting,
        pending: VecDeque::new(),
        last_id: None,
        last_numeric_id: None,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((event, state));
            }
            match std::mem::replace(&mut state.phase, Phase::Waiting) {
                Phase::Connecting => {
                    match state.transport.open(state.last_id.as_deref()).await {
                        Ok(body) => {
                            debug!(url = state.config.url(), "feed connected");
                            state.phase = Phase::Streaming(body, SseDecoder::default());
                            return Some((FeedEvent::Connected, state));
                        }
                        Err(err) => {
                            warn!(url = state.config.url(), error = %err, "feed connect failed");
                            return Some((
                                FeedEvent::Disconnected {
                                    reason: err.to_string(),
                                },
                                state,
                            ));
                        }
                    }
                }
                Phase::Streaming(mut body, mut decoder) => match body.next().await {
                    Some(Ok(chunk)) => {
                        for frame in decoder.push(&chunk) {
                            state.accept(frame);
                        }
                        state.phase = Phase::Streaming(body, decoder);
                    }
                    Some(Err(err)) => {
                        warn!(url = state.config.url(), error = %err, "feed interrupted");
                        return Some((
                            FeedEvent::Disconnected {
                                reason: err.to_string(),
                            },
                            state,
                        ));
                    }
                    None => {
                        debug!(url = state.config.url(), "feed closed by server");
                        return Some((
                            FeedEvent::Disconnected {
                                reason: "stream ended".to_owned(),
                            },
                            state,
                        ));
                    }
                },
                Phase::Waiting => {
                    tokio::time::sleep(state.config.reconnect_delay()).await;
                    state.phase = Phase::Connecting;
                }
            }
        }
    })
}
