//! Test helpers for inbound HTTP components.

use std::sync::Arc;
use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test;
use mockable::Clock;
use serde_json::json;

use crate::domain::ports::InventoryRepository;
use crate::domain::{
    AdminService, AlertService, AnalyticsService, AuthService, InventoryService,
    NotificationService, ProcurementService, PromotionService, ReadModels, Role, SalesService,
    default_rules,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::cache::MemoryReadModelCache;
use crate::outbound::live_bus::BroadcastBus;
use crate::outbound::memory::{
    DemoData, MemoryAlertRepository, MemoryCatalogue, MemoryInventoryRepository,
    MemoryNotificationRepository, MemoryOrderRepository, MemoryPromotionRepository,
    MemorySalesHistory, MemoryStaffDirectory,
};
use crate::test_support::FixtureClock;

/// Password shared by every member of the test directory.
pub const TEST_PASSWORD: &str = "retail-demo";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Handler state wired to in-memory adapters over the demo dataset, with the
/// clock frozen at [`FixtureClock::default_instant`].
pub struct TestState {
    pub state: HttpState,
    pub demo: DemoData,
    pub bus: Arc<BroadcastBus>,
    pub stock: Arc<MemoryInventoryRepository>,
}

impl TestState {
    pub fn new() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixtureClock::default());
        let now = clock.utc();
        let demo = DemoData::generate(42, now.date_naive(), now).expect("demo dataset");
        let catalogue = Arc::new(MemoryCatalogue::new(demo.stores.clone(), demo.items.clone()));
        let directory = Arc::new(MemoryStaffDirectory::new(demo.staff.clone(), TEST_PASSWORD));
        let history = Arc::new(MemorySalesHistory::new(demo.sales.clone()));
        let stock = Arc::new(MemoryInventoryRepository::new(demo.stock()));
        let bus = Arc::new(BroadcastBus::default());
        let read_models = ReadModels::new(
            Arc::new(MemoryReadModelCache::new()),
            Duration::from_secs(30),
        );

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
        let state = HttpState {
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
                stock.clone(),
                notifications.clone(),
                clock.clone(),
            ),
            notifications,
            inventory: inventory.clone(),
            promotions: PromotionService::new(
                Arc::new(MemoryPromotionRepository::new(demo.promotions.clone())),
                catalogue.clone(),
                history.clone(),
                read_models.clone(),
                clock.clone(),
            ),
            alerts: AlertService::new(
                Arc::new(MemoryAlertRepository::new(default_rules(now))),
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
            sales: SalesService::new(history, catalogue, bus.clone(), read_models, clock),
            live: bus.clone(),
        };
        Self {
            state,
            demo,
            bus,
            stock,
        }
    }

    /// Empty the first stock record so the next alert scan has a shortage
    /// to report. Returns the drained `(store_id, item_id)`.
    pub async fn drain_stock(&self) -> (u32, u32) {
        let first = self
            .stock
            .stock(None)
            .await
            .expect("stock")
            .into_iter()
            .next()
            .expect("seeded stock");
        self.stock
            .adjust(
                first.store_id,
                first.item_id,
                -first.quantity,
                FixtureClock::default_instant(),
            )
            .await
            .expect("drain");
        (first.store_id, first.item_id)
    }

    /// Email of the first demo member holding `role`.
    pub fn email_for(&self, role: Role) -> String {
        self.demo
            .staff
            .iter()
            .find(|member| member.role == role)
            .map(|member| member.email.clone())
            .expect("demo directory staffs every role")
    }
}

/// Sign in as the demo member holding `role` and return the session cookie.
pub async fn login_as<S>(app: &S, fixture: &TestState, role: Role) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": fixture.email_for(role), "password": TEST_PASSWORD }))
        .to_request();
    let response = test::call_service(app, request).await;
    assert!(
        response.status().is_success(),
        "login as {role} failed with {}",
        response.status()
    );
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
        .expect("session cookie")
}
