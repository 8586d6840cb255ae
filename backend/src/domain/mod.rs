//! Domain primitives, aggregates and services.
//!
//! Purpose: define the retail operations model (staff, procurement orders,
//! notifications, stock, promotions, alerts and sales) independently of HTTP
//! or storage. Services take their collaborators as [`ports`] trait objects
//! and report failures with the transport-agnostic [`Error`].
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: API error payload and stable identifiers.
//! - One service per area: [`AuthService`], [`AdminService`],
//!   [`ProcurementService`], [`NotificationService`], [`InventoryService`],
//!   [`PromotionService`], [`AlertService`], [`SalesService`] and
//!   [`AnalyticsService`].
//! - [`LiveEvent`]: what the stream endpoints push.
//! - [`TraceId`]: request correlation carried in a task-local.

pub mod admin;
pub mod alerts;
pub mod analytics;
pub mod auth;
pub mod catalogue;
pub mod error;
pub mod inventory;
pub mod live_events;
pub mod notifications;
pub mod pagination;
pub mod ports;
pub mod procurement;
pub mod promotions;
pub mod read_model;
pub mod sales;
pub mod staff;
pub mod trace_id;

pub use self::admin::{
    AdminService, CategorySales, StoreDetail, StoreOverview, StoreOverviewList, UserFilter,
};
pub use self::alerts::{
    Alert, AlertFilter, AlertId, AlertList, AlertRule, AlertRuleId, AlertRuleRequest, AlertRules,
    AlertService, AlertSeverity, AlertStatus, AlertSummary, AlertTransitionError, AlertType,
    RuleAction, RuleType, default_rules,
};
pub use self::analytics::{
    AnalyticsService, AnalyticsSummary, CategoryBreakdown, HistoryItems, HistoryPage,
    HistoryQuery, HistoryRange, HistoryStores, InventoryMovement, InventoryReport, Kpis,
    PerformanceReport, Prediction, SalesForecast, SalesReport, StoreDistribution,
    StreamingTrend, TopItems,
};
pub use self::auth::{AccessibleStores, AuthService, StaffProfile};
pub use self::catalogue::{CURRENCY, CatalogueItem, Store, round2};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::inventory::{
    CategoryInventory, InventoryFilter, InventoryItem, InventoryService, InventorySummary,
    LowStockReport, StockLevels, StockRecord, StockStatus, StoreInventory, Transfer, TransferId,
    TransferRequest, TransferStatus,
};
pub use self::live_events::{Channel, LiveEvent};
pub use self::notifications::{
    NewNotification, Notification, NotificationFeed, NotificationId, NotificationKind,
    NotificationService, NotificationSeverity,
};
pub use self::pagination::{Page, PageRequest, PageRequestError};
pub use self::procurement::{
    ApprovalStep, ApproverRole, ChainStage, ChangeEntry, ChangeLog, CreateOrderRequest, Decision,
    HistoryAction, HistoryEntry, OrderFilter, OrderId, OrderStatus, Priority, ProcurementDashboard,
    ProcurementOrder, ProcurementService, ProcurementSummary, ReviewRequest, StepStatus,
    TeamMember, WorkflowError,
};
pub use self::promotions::{
    ActivePromotions, CreatePromotionRequest, DiscountType, Promotion, PromotionFilter,
    PromotionId, PromotionService, PromotionStatus, PromotionSuggestion, PromotionSuggestions,
    PromotionSummary, UpdatePromotionRequest,
};
pub use self::read_model::ReadModels;
pub use self::sales::{
    DailySales, SaleEvent, SaleId, SalesMetrics, SalesService, SalesTrend, TopItem, TrendPoint,
};
pub use self::staff::{
    ItemId, LoginCredentials, LoginValidationError, Permissions, Role, StaffId, StaffMember,
    StoreId, StoreScope, UnknownRole,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use retail_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
