//! Live event fan-out over a `tokio` broadcast channel.

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

use crate::domain::LiveEvent;
use crate::domain::ports::{LiveEventBus, LiveEventStream};

/// Events buffered per subscriber before the slowest ones start skipping.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Broadcast bus shared by the feed generator, services and stream handlers.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<LiveEvent>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl LiveEventBus for BroadcastBus {
    fn publish(&self, event: LiveEvent) {
        if self.sender.send(event).is_err() {
            debug!("live event dropped: no subscribers");
        }
    }

    fn subscribe(&self) -> LiveEventStream {
        BroadcastStream::new(self.sender.subscribe())
            .filter_map(|received| async move {
                match received {
                    Ok(event) => Some(event),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(skipped, "live subscriber lagged; skipping missed events");
                        None
                    }
                }
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SaleEvent, SaleId};
    use crate::test_support::FixtureClock;

    fn sale(id: u64) -> LiveEvent {
        LiveEvent::Sale(SaleEvent {
            id: SaleId(id),
            store_id: 1,
            store_name: "Store 1".to_owned(),
            item_id: 7,
            item_name: "Item 7".to_owned(),
            units: 1,
            revenue: 13.5,
            recorded_at: FixtureClock::default_instant(),
            is_streaming: true,
        })
    }

    fn id_of(event: Option<LiveEvent>) -> Option<String> {
        event.map(|event| event.event_id())
    }

    #[tokio::test]
    async fn subscribers_receive_events_published_after_subscribing() {
        let bus = BroadcastBus::default();
        bus.publish(sale(1));
        let mut stream = bus.subscribe();
        bus.publish(sale(2));
        assert_eq!(id_of(stream.next().await), Some("2".to_owned()));
    }

    #[tokio::test]
    async fn lagging_subscribers_skip_ahead() {
        let bus = BroadcastBus::new(2);
        let mut stream = bus.subscribe();
        for id in 1..=5 {
            bus.publish(sale(id));
        }
        assert_eq!(id_of(stream.next().await), Some("4".to_owned()));
        assert_eq!(id_of(stream.next().await), Some("5".to_owned()));
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = BroadcastBus::default();
        bus.publish(sale(1));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
