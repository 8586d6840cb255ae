//! Builders for HTTP state: demo-seeded repositories behind fallback
//! decorators, the read-model cache and the live sale generator.

use std::sync::Arc;

use mock_data::DEMO_PASSWORD;
use mockable::Clock;
use tracing::{info, warn};

use retail_backend::domain::ports::{
    InventoryRepository, ReadModelCache, SalesHistory, StaffDirectory, StoreCatalogue,
};
use retail_backend::domain::{
    AdminService, AlertService, AnalyticsService, AuthService, InventoryService,
    NotificationService, ProcurementService, PromotionService, ReadModels, SalesService,
    default_rules,
};
use retail_backend::inbound::http::state::HttpState;
use retail_backend::outbound::cache::{
    MemoryReadModelCache, RedisCacheConfig, RedisReadModelCache,
};
use retail_backend::outbound::fallback::{
    FallbackCatalogue, FallbackInventory, FallbackPromotions, FallbackSalesHistory,
    FallbackStaffDirectory,
};
use retail_backend::outbound::feed::SalesFeed;
use retail_backend::outbound::live_bus::BroadcastBus;
use retail_backend::outbound::memory::{
    DemoData, MemoryAlertRepository, MemoryCatalogue, MemoryInventoryRepository,
    MemoryNotificationRepository, MemoryOrderRepository, MemoryPromotionRepository,
    MemorySalesHistory, MemoryStaffDirectory,
};

use super::ServerConfig;

/// Handler state plus the generator that feeds its live streams.
pub(crate) struct BuiltState {
    pub(crate) http: HttpState,
    pub(crate) feed: Option<SalesFeed>,
    pub(crate) bus: Arc<BroadcastBus>,
}

/// Read ports shared by several services.
struct ReadPorts {
    catalogue: Arc<dyn StoreCatalogue>,
    directory: Arc<dyn StaffDirectory>,
    history: Arc<dyn SalesHistory>,
    stock: Arc<dyn InventoryRepository>,
}

/// In-memory primaries seeded from `demo`, each wrapped so an empty or
/// failing read is answered from the same dataset.
fn build_read_ports(demo: &DemoData) -> ReadPorts {
    let catalogue = Arc::new(MemoryCatalogue::new(demo.stores.clone(), demo.items.clone()));
    let directory = Arc::new(MemoryStaffDirectory::new(demo.staff.clone(), DEMO_PASSWORD));
    let history = Arc::new(MemorySalesHistory::new(demo.sales.clone()));
    let stock = Arc::new(MemoryInventoryRepository::new(demo.stock()));
    ReadPorts {
        catalogue: Arc::new(FallbackCatalogue::new(catalogue, demo)),
        directory: Arc::new(FallbackStaffDirectory::new(directory, demo)),
        history: Arc::new(FallbackSalesHistory::new(history, demo)),
        stock: Arc::new(FallbackInventory::new(stock, demo)),
    }
}

/// Redis when a URL is configured and reachable, the in-process cache
/// otherwise.
async fn build_cache(redis_url: Option<&str>) -> Arc<dyn ReadModelCache> {
    let Some(url) = redis_url else {
        info!("using in-process read-model cache");
        return Arc::new(MemoryReadModelCache::new());
    };
    match RedisReadModelCache::connect(&RedisCacheConfig::new(url)).await {
        Ok(cache) => {
            info!("using Redis read-model cache");
            Arc::new(cache)
        }
        Err(err) => {
            warn!(error = %err, "Redis unavailable; using in-process read-model cache");
            Arc::new(MemoryReadModelCache::new())
        }
    }
}

fn build_services(
    demo: &DemoData,
    ports: ReadPorts,
    read_models: &ReadModels,
    bus: &Arc<BroadcastBus>,
    clock: &Arc<dyn Clock>,
) -> HttpState {
    let ReadPorts {
        catalogue,
        directory,
        history,
        stock,
    } = ports;
    let inventory = InventoryService::new(
        stock.clone(),
        catalogue.clone(),
        read_models.clone(),
        clock.clone(),
    );
    let notifications = NotificationService::new(
        Arc::new(MemoryNotificationRepository::new()),
        bus.clone(),
        clock.clone(),
    );
    let promotions = Arc::new(FallbackPromotions::new(
        Arc::new(MemoryPromotionRepository::new(demo.promotions.clone())),
        demo,
    ));
    HttpState {
        auth: AuthService::new(directory.clone(), catalogue.clone()),
        admin: AdminService::new(
            directory.clone(),
            catalogue.clone(),
            history.clone(),
            clock.clone(),
        ),
        procurement: ProcurementService::new(
            Arc::new(MemoryOrderRepository::new()),
            catalogue.clone(),
            directory,
            stock,
            notifications.clone(),
            clock.clone(),
        ),
        notifications,
        inventory: inventory.clone(),
        promotions: PromotionService::new(
            promotions,
            catalogue.clone(),
            history.clone(),
            read_models.clone(),
            clock.clone(),
        ),
        alerts: AlertService::new(
            Arc::new(MemoryAlertRepository::new(default_rules(clock.utc()))),
            inventory,
            history.clone(),
            catalogue.clone(),
            bus.clone(),
            clock.clone(),
        ),
        analytics: AnalyticsService::new(
            history.clone(),
            catalogue.clone(),
            read_models.clone(),
            clock.clone(),
        ),
        sales: SalesService::new(
            history,
            catalogue,
            bus.clone(),
            read_models.clone(),
            clock.clone(),
        ),
        live: bus.clone(),
    }
}

/// Build handler state from `config`.
///
/// # Errors
/// Returns [`std::io::Error`] when the demo dataset cannot be generated.
pub(crate) async fn build_http_state(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> std::io::Result<BuiltState> {
    let now = clock.utc();
    let demo = DemoData::generate(config.mock_seed, now.date_naive(), now).map_err(|err| {
        std::io::Error::other(format!("demo dataset generation failed: {err}"))
    })?;
    info!(
        seed = config.mock_seed,
        stores = demo.stores.len(),
        items = demo.items.len(),
        staff = demo.staff.len(),
        "demo dataset generated"
    );

    let cache = build_cache(config.redis_url.as_deref()).await;
    let read_models = ReadModels::new(cache, config.cache_ttl);
    let bus = Arc::new(BroadcastBus::default());
    let http = build_services(&demo, build_read_ports(&demo), &read_models, &bus, &clock);

    let feed = config.feed.map(|settings| {
        SalesFeed::new(
            SalesFeed::ticker_for(config.mock_seed, &demo),
            http.sales.clone(),
            http.alerts.clone(),
            clock.clone(),
            settings,
        )
    });
    Ok(BuiltState { http, feed, bus })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use actix_web::cookie::{Key, SameSite};
    use futures_util::StreamExt;
    use retail_backend::domain::ports::LiveEventBus;
    use retail_backend::domain::{LiveEvent, LoginCredentials, Role};
    use retail_backend::test_support::{FixtureClock, staff_with_role};
    use rstest::rstest;

    fn config() -> ServerConfig {
        ServerConfig::new(
            Key::generate(),
            false,
            SameSite::Lax,
            SocketAddr::from(([127, 0, 0, 1], 0)),
        )
    }

    fn fixture_clock() -> Arc<dyn Clock> {
        Arc::new(FixtureClock::default())
    }

    #[rstest]
    #[tokio::test]
    async fn demo_staff_sign_in_with_the_shared_password() {
        let built = build_http_state(&config(), fixture_clock())
            .await
            .expect("state builds");
        let now = FixtureClock::default_instant();
        let demo = DemoData::generate(42, now.date_naive(), now).expect("demo dataset");
        let email = demo.staff.first().expect("demo staff").email.clone();

        let credentials =
            LoginCredentials::try_from_parts(&email, DEMO_PASSWORD).expect("credential shape");
        let member = built.http.auth.login(&credentials).await.expect("login");
        assert_eq!(member.email, email);

        let wrong = LoginCredentials::try_from_parts(&email, "nope").expect("credential shape");
        assert!(built.http.auth.login(&wrong).await.is_err());
    }

    #[rstest]
    #[case(Some(retail_backend::outbound::feed::FeedSettings::default()), true)]
    #[case(None, false)]
    #[tokio::test]
    async fn feed_follows_configuration(
        #[case] feed: Option<retail_backend::outbound::feed::FeedSettings>,
        #[case] expected: bool,
    ) {
        let built = build_http_state(&config().with_feed(feed), fixture_clock())
            .await
            .expect("state builds");
        assert_eq!(built.feed.is_some(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn generated_sales_reach_live_subscribers() {
        let built = build_http_state(&config(), fixture_clock())
            .await
            .expect("state builds");
        let mut events = built.http.live.subscribe();
        let mut feed = built.feed.expect("feed enabled by default");
        let sale = feed.tick().await.expect("generated sale");

        let event = events.next().await.expect("live event");
        assert!(matches!(event, LiveEvent::Sale(ref seen) if seen.id == sale.id));
    }

    #[rstest]
    #[tokio::test]
    async fn unreachable_redis_falls_back_to_the_process_cache() {
        let config = config().with_cache(
            Some("redis://127.0.0.1:1".to_owned()),
            std::time::Duration::from_secs(5),
        );
        let built = build_http_state(&config, fixture_clock())
            .await
            .expect("state builds without Redis");
        let admin = staff_with_role(Role::SuperAdmin);
        let metrics = built
            .http
            .sales
            .metrics(&admin, None)
            .await
            .expect("metrics served");
        assert_eq!(metrics.currency, "AED");
    }
}
