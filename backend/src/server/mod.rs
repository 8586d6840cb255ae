//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::ServerConfig;

#[cfg(feature = "metrics")]
pub(crate) use metrics::make_metrics;
#[cfg(feature = "metrics")]
use metrics::{MetricsLayer, live_subscriber_gauge, sample_live_subscribers};
use state_builders::{BuiltState, build_http_state};

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::{Clock, DefaultClock};
use tracing::info;

use retail_backend::Trace;
#[cfg(debug_assertions)]
use retail_backend::doc::ApiDoc;
use retail_backend::inbound::http::error::{
    json_error_handler, path_error_handler, query_error_handler,
};
use retail_backend::inbound::http::health::{HealthState, live, ready};
use retail_backend::inbound::http::session_config::fingerprint::key_fingerprint;
use retail_backend::inbound::http::state::HttpState;
use retail_backend::inbound::{http, sse};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .wrap(session)
        .wrap(Trace)
        .service(web::scope("/api").configure(http::configure))
        .configure(sse::configure)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Builds the handler state, starts the live sale generator when enabled and
/// binds the listener. Readiness is flipped once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when the state cannot be built or binding
/// the socket fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let BuiltState {
        http: http_state,
        feed,
        bus,
    } = build_http_state(&config, clock).await?;
    let http_state = web::Data::new(http_state);
    info!(fingerprint = %key_fingerprint(&config.key), "session key loaded");

    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
        ..
    } = config;

    #[cfg(feature = "metrics")]
    if let Some(prometheus) = &prometheus {
        let gauge = live_subscriber_gauge(&prometheus.registry)?;
        sample_live_subscribers(gauge, bus);
    }
    #[cfg(not(feature = "metrics"))]
    drop(bus);
    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    if let Some(feed) = feed {
        feed.spawn();
    }
    health_state.mark_ready();
    info!(%bind_addr, "server listening");
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use retail_backend::test_support::FixtureClock;
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::net::SocketAddr;

    async fn deps() -> AppDependencies {
        let config = ServerConfig::new(
            Key::generate(),
            false,
            SameSite::Lax,
            SocketAddr::from(([127, 0, 0, 1], 0)),
        )
        .with_feed(None);
        let built = build_http_state(&config, Arc::new(FixtureClock::default()))
            .await
            .expect("state builds");
        AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            http_state: web::Data::new(built.http),
            key: config.key.clone(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn api_requires_a_session() {
        let app = test::init_service(build_app(deps().await)).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/inventory/summary").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().contains_key("trace-id"));
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_json_maps_to_invalid_request() {
        let app = test::init_service(build_app(deps().await)).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .insert_header(("content-type", "application/json"))
                .set_payload("{not json")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "invalid_request");
    }

    #[rstest]
    #[actix_web::test]
    async fn demo_login_then_scoped_reads() {
        let app = test::init_service(build_app(deps().await)).await;
        let now = FixtureClock::default_instant();
        let demo = retail_backend::outbound::memory::DemoData::generate(42, now.date_naive(), now)
            .expect("demo dataset");
        let email = demo.staff.first().expect("demo staff").email.clone();

        let login = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": email, "password": mock_data::DEMO_PASSWORD }))
                .to_request(),
        )
        .await;
        assert_eq!(login.status(), StatusCode::OK);
        let cookie = login
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(|cookie| cookie.into_owned())
            .expect("session cookie");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/auth/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["email"], email.as_str());
    }

    #[rstest]
    #[actix_web::test]
    async fn probes_report_readiness() {
        let deps = deps().await;
        let health = deps.health_state.clone();
        let app = test::init_service(build_app(deps)).await;
        let before =
            test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request())
                .await;
        assert_eq!(before.status(), StatusCode::SERVICE_UNAVAILABLE);
        health.mark_ready();
        let after =
            test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request())
                .await;
        assert_eq!(after.status(), StatusCode::OK);
    }
}
