//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on domain services and the live event port, and stay testable without
//! I/O.

use std::sync::Arc;

use crate::domain::ports::LiveEventBus;
use crate::domain::{
    AdminService, AlertService, AnalyticsService, AuthService, InventoryService, NotificationService,
    ProcurementService, PromotionService, SalesService,
};

/// Dependency bundle for HTTP and stream handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: AuthService,
    pub admin: AdminService,
    pub procurement: ProcurementService,
    pub notifications: NotificationService,
    pub inventory: InventoryService,
    pub promotions: PromotionService,
    pub alerts: AlertService,
    pub sales: SalesService,
    pub analytics: AnalyticsService,
    pub live: Arc<dyn LiveEventBus>,
}
