//! Mock substitution while a feed is offline.

use futures_util::stream::{self, Stream, StreamExt};

use crate::decoder::SseFrame;
use crate::subscription::FeedEvent;

/// Follow every disconnect with a locally generated frame.
///
/// `generator` is called once per [`FeedEvent::Disconnected`]; when it returns
/// a frame the frame is yielded as [`FeedEvent::Fallback`] straight after the
/// disconnect, so consumers always have something to render.
///
/// # Example
///
/// ```
/// use futures_util::{StreamExt, stream};
/// use live_feed::{FeedEvent, SseFrame, with_fallback};
///
/// # tokio_test_block(async {
/// let source = stream::iter(vec![FeedEvent::Disconnected { reason: "down".to_owned() }]);
/// let events: Vec<_> = with_fallback(source, || Some(SseFrame::new("sales", "{}")))
///     .collect()
///     .await;
/// assert_eq!(events.len(), 2);
/// assert_eq!(events[1], FeedEvent::Fallback(SseFrame::new("sales", "{}")));
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     futures_util::FutureExt::now_or_never(f).expect("ready")
/// # }
/// ```
pub fn with_fallback<S, G>(source: S, mut generator: G) -> impl Stream<Item = FeedEvent>
where
    S: Stream<Item = FeedEvent>,
    G: FnMut() -> Option<SseFrame>,
{
    source.flat_map(move |event| {
        let substitute = match &event {
            FeedEvent::Disconnected { .. } => generator().map(FeedEvent::Fallback),
            _ => None,
        };
        stream::iter(std::iter::once(event).chain(substitute))
    })
}
