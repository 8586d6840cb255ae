//! Retail operations service entry-point: REST, live streams and OpenAPI docs.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use retail_backend::AppSettings;
use retail_backend::inbound::http::health::HealthState;
use retail_backend::inbound::http::session_config::{
    BuildMode, SessionOverrides, session_settings,
};
use retail_backend::outbound::feed::FeedSettings;
use server::ServerConfig;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os()).map_err(|err| {
        error!(error = %err, "failed to load settings");
        std::io::Error::other(err.to_string())
    })?;
    let overrides = SessionOverrides {
        key_file: settings.session_key_file.clone(),
        cookie_secure: settings.cookie_secure,
    };
    let session = session_settings(
        &overrides,
        &DefaultEnv::new(),
        BuildMode::from_debug_assertions(),
    )
    .map_err(|err| {
        error!(error = %err, "invalid session configuration");
        std::io::Error::other(err.to_string())
    })?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| std::io::Error::other(format!("invalid bind address: {err}")))?;

    let feed = settings.stream_interval().map(|interval| FeedSettings {
        interval,
        scan_every: settings.alert_scan_every(),
    });
    if feed.is_none() {
        info!("live sale generator disabled");
    }

    let config = ServerConfig::new(session.key, session.cookie_secure, session.same_site, bind_addr)
        .with_mock_seed(settings.mock_seed())
        .with_cache(settings.redis_url().map(str::to_owned), settings.cache_ttl())
        .with_feed(feed);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(server::make_metrics()?));

    let health_state = web::Data::new(HealthState::new());
    let server = server::create_server(health_state.clone(), config).await?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
