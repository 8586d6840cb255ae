//! Server-sent event streams bridging the live event bus to browsers.
//!
//! Responsibilities:
//! - authenticate the subscriber from the session cookie
//! - filter bus events by channel and by the subscriber's store scope
//! - frame events as `text/event-stream` and interleave keep-alive comments
//!
//! ```text
//! GET /stream/sales    event: connected, then event: sales
//! GET /stream/alerts   event: connected, then event: alert | notification
//! ```

use std::convert::Infallible;
use std::time::Duration;

use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::web::{self, Bytes};
use actix_web::{HttpResponse, get};
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::json;
use tokio::time::{Instant, interval_at};
use tokio_stream::wrappers::IntervalStream;
use tracing::{info, warn};

use crate::domain::{Channel, LiveEvent, StaffMember};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Gap between `: keep-alive` comments.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

const KEEP_ALIVE_FRAME: &[u8] = b": keep-alive\n\n";

/// Encode one SSE frame. Multi-line data is split across `data:` lines.
pub fn encode_frame(event: &str, id: Option<&str>, data: &str) -> Bytes {
    let mut frame = String::with_capacity(data.len() + 32);
    if let Some(id) = id {
        frame.push_str("id: ");
        frame.push_str(id);
        frame.push('\n');
    }
    frame.push_str("event: ");
    frame.push_str(event);
    frame.push('\n');
    for line in data.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    Bytes::from(frame)
}

fn event_frame(event: &LiveEvent) -> Option<Bytes> {
    match serde_json::to_string(event) {
        Ok(data) => Some(encode_frame(
            event.event_name(),
            Some(&event.event_id()),
            &data,
        )),
        Err(error) => {
            warn!(%error, event = event.event_name(), "failed to serialise live event");
            None
        }
    }
}

fn channel_name(channel: Channel) -> &'static str {
    match channel {
        Channel::Sales => "sales",
        Channel::Alerts => "alerts",
    }
}

/// Connected frame, then every visible event on `channel`, with keep-alive
/// comments every `keep_alive`.
pub fn event_stream(
    state: &HttpState,
    member: StaffMember,
    channel: Channel,
    keep_alive: Duration,
) -> impl Stream<Item = Result<Bytes, Infallible>> + 'static {
    let connected = encode_frame(
        "connected",
        None,
        &json!({ "channel": channel_name(channel) }).to_string(),
    );
    let events = state.live.subscribe().filter_map(move |event| {
        let frame = (event.channel() == channel && event.visible_to(&member))
            .then(|| event_frame(&event))
            .flatten();
        async move { frame }
    });
    let ticks = IntervalStream::new(interval_at(Instant::now() + keep_alive, keep_alive))
        .map(|_| Bytes::from_static(KEEP_ALIVE_FRAME));
    stream::once(async move { connected })
        .chain(stream::select(events, ticks))
        .map(Ok)
}

async fn open(
    state: web::Data<HttpState>,
    session: SessionContext,
    channel: Channel,
) -> ApiResult<HttpResponse> {
    let member = session.current_member(&state.auth).await?;
    info!(staff = %member.email, channel = channel_name(channel), "stream opened");
    let body = event_stream(&state, member, channel, KEEP_ALIVE_INTERVAL);
    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(body))
}

/// Live sales within the caller's scope.
#[utoipa::path(
    get,
    path = "/stream/sales",
    responses(
        (status = 200, description = "Server-sent sales events", content_type = "text/event-stream", body = String),
        (status = 401, description = "Not signed in", body = crate::domain::Error)
    ),
    tags = ["stream"],
    operation_id = "streamSales"
)]
#[get("/sales")]
pub async fn sales_stream(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    open(state, session, Channel::Sales).await
}

/// Alerts and notifications visible to the caller.
#[utoipa::path(
    get,
    path = "/stream/alerts",
    responses(
        (status = 200, description = "Server-sent alert and notification events", content_type = "text/event-stream", body = String),
        (status = 401, description = "Not signed in", body = crate::domain::Error)
    ),
    tags = ["stream"],
    operation_id = "streamAlerts"
)]
#[get("/alerts")]
pub async fn alerts_stream(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    open(state, session, Channel::Alerts).await
}

/// Register the stream routes on a `/stream` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stream")
            .service(sales_stream)
            .service(alerts_stream),
    );
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;

    use super::*;
    use crate::domain::ports::LiveEventBus;
    use crate::domain::{Role, SaleEvent, SaleId};
    use crate::inbound::http::auth::login;
    use crate::inbound::http::test_utils::{TestState, login_as, test_session_middleware};
    use crate::test_support::FixtureClock;
    use actix_web::body::MessageBody;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use futures_util::future::poll_fn;

    fn test_app(
        fixture: &TestState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(fixture.state.clone()))
            .wrap(test_session_middleware())
            .service(web::scope("/api").service(login))
            .configure(configure)
    }

    fn sale(id: u64, store_id: u32) -> LiveEvent {
        LiveEvent::Sale(SaleEvent {
            id: SaleId(id),
            store_id,
            store_name: format!("Store {store_id}"),
            item_id: 1,
            item_name: "Item 1".to_owned(),
            units: 2,
            revenue: 20.0,
            recorded_at: FixtureClock::default_instant(),
            is_streaming: true,
        })
    }

    async fn next_chunk<B>(body: &mut Pin<Box<B>>) -> String
    where
        B: MessageBody,
        B::Error: std::fmt::Debug,
    {
        let chunk = poll_fn(|cx| body.as_mut().poll_next(cx))
            .await
            .expect("stream ended")
            .expect("chunk");
        String::from_utf8(chunk.to_vec()).expect("utf-8 frame")
    }

    #[actix_web::test]
    async fn frames_split_multi_line_data() {
        let frame = encode_frame("sales", Some("7"), "a\nb");
        assert_eq!(&frame[..], b"id: 7\nevent: sales\ndata: a\ndata: b\n\n");
    }

    #[actix_web::test]
    async fn sales_stream_starts_connected_then_forwards_visible_sales() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::StoreManager).await;
        let manager = fixture
            .demo
            .staff
            .iter()
            .find(|member| member.role == Role::StoreManager)
            .expect("store manager");
        let own = fixture
            .demo
            .stores
            .iter()
            .find(|store| manager.scope.contains(store.id))
            .expect("own store")
            .id;
        let foreign = fixture
            .demo
            .stores
            .iter()
            .find(|store| !manager.scope.contains(store.id))
            .expect("foreign store")
            .id;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/stream/sales")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );
        let mut body = Box::pin(res.into_body());
        let first = next_chunk(&mut body).await;
        assert!(first.starts_with("event: connected\n"), "{first}");

        fixture.bus.publish(sale(1, foreign));
        fixture.bus.publish(sale(2, own));
        let frame = next_chunk(&mut body).await;
        assert!(frame.starts_with("id: 2\nevent: sales\n"), "{frame}");
    }

    #[actix_web::test]
    async fn streams_require_a_session() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/stream/alerts").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_streams_emit_keep_alive_comments() {
        let fixture = TestState::new();
        let member = fixture
            .demo
            .staff
            .iter()
            .find(|member| member.role == Role::Analyst)
            .cloned()
            .expect("analyst");
        let mut stream = Box::pin(event_stream(
            &fixture.state,
            member,
            Channel::Alerts,
            KEEP_ALIVE_INTERVAL,
        ));
        let connected = stream.next().await.expect("connected").expect("bytes");
        assert!(connected.starts_with(b"event: connected"));
        let tick = stream.next().await.expect("tick").expect("bytes");
        assert_eq!(&tick[..], KEEP_ALIVE_FRAME);
    }

    #[tokio::test]
    async fn sales_do_not_leak_onto_the_alerts_channel() {
        let fixture = TestState::new();
        let member = fixture
            .demo
            .staff
            .iter()
            .find(|member| member.role == Role::SuperAdmin)
            .cloned()
            .expect("super admin");
        let mut stream = Box::pin(event_stream(
            &fixture.state,
            member,
            Channel::Alerts,
            Duration::from_secs(3600),
        ));
        stream.next().await.expect("connected").expect("bytes");
        fixture.bus.publish(sale(5, fixture.demo.stores[0].id));
        let pending = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
        assert!(pending.is_err(), "sale frame reached the alerts channel");
    }
}
