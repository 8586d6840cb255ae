//! Follow a live stream and print one JSON line per event.
//!
//! ```text
//! feed-tail --cookie 'session=...' sales
//! feed-tail --mock alerts
//! ```
//!
//! Reconnects after a fixed delay when the connection drops. With `--mock`,
//! every disconnect on the sales channel is followed by a generated sale so
//! the output never goes quiet.

use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use futures_util::StreamExt;
use live_feed::{FeedConfig, FeedEvent, HttpTransport, SseFrame, subscribe, with_fallback};
use mock_data::{DatasetOptions, SaleTicker, generate_dataset};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Channel {
    Sales,
    Alerts,
}

impl Channel {
    fn path(self) -> &'static str {
        match self {
            Self::Sales => "/stream/sales",
            Self::Alerts => "/stream/alerts",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "feed-tail", about = "Print live retail events as JSON lines")]
struct Args {
    /// Stream to follow.
    #[arg(value_enum, default_value_t = Channel::Sales)]
    channel: Channel,
    /// Base URL of the service.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    base_url: String,
    /// Cookie header value carrying the session, e.g. `session=...`.
    #[arg(long)]
    cookie: Option<String>,
    /// Seconds to wait before reconnecting.
    #[arg(long, default_value_t = 5)]
    reconnect_secs: u64,
    /// Substitute generated sales while disconnected.
    #[arg(long)]
    mock: bool,
    /// Seed for generated sales.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Stop after this many events.
    #[arg(long)]
    limit: Option<usize>,
}

fn stream_url(base_url: &str, channel: Channel) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), channel.path())
}

fn frame_json(frame: &SseFrame) -> Value {
    let data = serde_json::from_str(&frame.data).unwrap_or_else(|_| Value::String(frame.data.clone()));
    json!({ "event": frame.event, "id": frame.id, "data": data })
}

fn render(event: &FeedEvent) -> Value {
    match event {
        FeedEvent::Connected => json!({ "status": "connected" }),
        FeedEvent::Disconnected { reason } => json!({ "status": "disconnected", "reason": reason }),
        FeedEvent::Message(frame) => frame_json(frame),
        FeedEvent::Fallback(frame) => {
            let mut value = frame_json(frame);
            value["mock"] = Value::Bool(true);
            value
        }
    }
}

/// Generated sales calibrated on the demo history for `seed`.
fn mock_sales(seed: u64) -> Result<impl FnMut() -> Option<SseFrame>, Box<dyn std::error::Error>> {
    let dataset = generate_dataset(&DatasetOptions::new(seed, Utc::now().date_naive()))?;
    let mut ticker = SaleTicker::new(
        seed,
        dataset.stores.iter().map(|store| store.id).collect(),
        dataset.items.iter().map(|item| item.id).collect(),
        &dataset.sales,
    );
    Ok(move || {
        let tick = ticker.next_tick(Utc::now())?;
        let data = serde_json::to_string(&tick).ok()?;
        Some(SseFrame::new("sales", data))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = FeedConfig::new(stream_url(&args.base_url, args.channel))
        .with_reconnect_delay(Duration::from_secs(args.reconnect_secs));
    let mut transport = HttpTransport::new(&config)?;
    if let Some(cookie) = &args.cookie {
        transport = transport.with_cookie(cookie.as_str());
    }

    let events = subscribe(transport, config);
    let mut events = if args.mock && args.channel == Channel::Sales {
        let mut generate = mock_sales(args.seed)?;
        with_fallback(events, move || generate()).boxed_local()
    } else {
        events.boxed_local()
    };

    let mut stdout = std::io::stdout().lock();
    let mut printed = 0_usize;
    while let Some(event) = events.next().await {
        writeln!(stdout, "{}", render(&event))?;
        printed += 1;
        if args.limit.is_some_and(|limit| printed >= limit) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:8080", Channel::Sales, "http://localhost:8080/stream/sales")]
    #[case("http://localhost:8080/", Channel::Alerts, "http://localhost:8080/stream/alerts")]
    fn urls_join_cleanly(#[case] base: &str, #[case] channel: Channel, #[case] expected: &str) {
        assert_eq!(stream_url(base, channel), expected);
    }

    #[rstest]
    fn json_payloads_are_inlined() {
        let frame = SseFrame::new("sales", r#"{"units":3}"#).with_id("9");
        let line = render(&FeedEvent::Message(frame));
        assert_eq!(line, json!({ "event": "sales", "id": "9", "data": { "units": 3 } }));
    }

    #[rstest]
    fn fallback_frames_are_flagged() {
        let line = render(&FeedEvent::Fallback(SseFrame::new("sales", "plain")));
        assert_eq!(line["mock"], true);
        assert_eq!(line["data"], "plain");
    }

    #[rstest]
    fn mock_sales_are_generated() {
        let mut generate = mock_sales(7).expect("dataset");
        let frame = generate().expect("generated sale");
        assert_eq!(frame.event, "sales");
        let tick: Value = serde_json::from_str(&frame.data).expect("json");
        assert!(tick["units"].as_u64().is_some());
        assert!(tick["storeId"].as_u64().is_some());
    }
}
