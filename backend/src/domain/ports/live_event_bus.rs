//! Port carrying live events to stream subscribers.

use futures_util::stream::BoxStream;

use crate::domain::LiveEvent;

/// Stream handed to each subscriber.
pub type LiveEventStream = BoxStream<'static, LiveEvent>;

/// Fan-out of live events.
///
/// Publishing never blocks and never fails; with no subscribers the event is
/// dropped. Subscribers that fall behind lose the oldest events.
#[cfg_attr(test, mockall::automock)]
pub trait LiveEventBus: Send + Sync {
    fn publish(&self, event: LiveEvent);

    /// Events published after this call.
    fn subscribe(&self) -> LiveEventStream;
}
