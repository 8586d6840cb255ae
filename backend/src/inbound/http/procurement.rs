//! Procurement orders, their approval workflow and the logistics
//! notification feed.
//!
//! Every route lives under `/api/logistics`:
//!
//! ```text
//! GET  /dashboard
//! GET  /orders?status&priority&store_id&page&limit
//! POST /orders                         POST /orders/bulk
//! GET  /orders/{id}
//! POST /orders/{id}/logistics-review   POST /orders/{id}/vp-approval
//! POST /orders/{id}/ship               POST /orders/{id}/deliver
//! POST /orders/{id}/cancel
//! GET  /team   GET /approval-chain   GET /changes?limit
//! GET  /notifications?unread_only&limit
//! POST /notifications/{id}/read        POST /notifications/read-all
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ChainStage, ChangeLog, CreateOrderRequest, Error, NotificationFeed, NotificationId, OrderFilter,
    OrderId, OrderStatus, PageRequest, Priority, ProcurementDashboard, ProcurementOrder,
    ReviewRequest, StoreId, TeamMember,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::pages::OrderPage;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const DEFAULT_ORDERS_LIMIT: u32 = 50;
const MAX_ORDERS_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
    pub priority: Option<Priority>,
    pub store_id: Option<StoreId>,
    #[param(minimum = 1)]
    pub page: Option<u32>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<u32>,
}

/// Body of `POST /orders/bulk`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkOrderRequest {
    pub orders: Vec<CreateOrderRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkOrderResponse {
    pub created: usize,
    pub orders: Vec<ProcurementOrder>,
}

/// Body of `POST /orders/{id}/cancel`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelRequest {
    #[serde(default, alias = "comments")]
    #[schema(example = "Supplier out of stock")]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    #[param(minimum = 1)]
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[param(minimum = 1, maximum = 200)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkedCount {
    pub marked_count: usize,
}

/// Status counts, cost totals and the most recent orders.
#[utoipa::path(
    get,
    path = "/api/logistics/dashboard",
    responses(
        (status = 200, description = "Procurement dashboard", body = ProcurementDashboard),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "procurementDashboard"
)]
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ProcurementDashboard>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.procurement.dashboard(&member).await?))
}

/// Orders within scope, critical first then newest.
#[utoipa::path(
    get,
    path = "/api/logistics/orders",
    params(OrdersQuery),
    responses(
        (status = 200, description = "Order page", body = OrderPage),
        (status = 400, description = "Invalid filter or paging", body = Error),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "listOrders"
)]
#[get("/orders")]
pub async fn list_orders(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<OrdersQuery>,
) -> ApiResult<web::Json<OrderPage>> {
    let member = session.current_member(&state.auth).await?;
    let OrdersQuery {
        status,
        priority,
        store_id,
        page,
        limit,
    } = query.into_inner();
    let page = PageRequest::new(page, limit, DEFAULT_ORDERS_LIMIT, MAX_ORDERS_LIMIT)?;
    let filter = OrderFilter {
        status,
        priority,
        store_id,
    };
    let orders = state.procurement.list(&member, &filter, page).await?;
    Ok(web::Json(orders.into()))
}

/// Raise an order for logistics review.
#[utoipa::path(
    post,
    path = "/api/logistics/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ProcurementOrder),
        (status = 400, description = "Invalid quantity or cost", body = Error),
        (status = 403, description = "Store outside scope", body = Error),
        (status = 404, description = "Unknown item or store", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "createOrder"
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateOrderRequest>,
) -> ApiResult<HttpResponse> {
    let member = session.current_member(&state.auth).await?;
    let order = state.procurement.create(&member, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

/// Raise up to 100 orders at once. Nothing is stored if any entry fails.
#[utoipa::path(
    post,
    path = "/api/logistics/orders/bulk",
    request_body = BulkOrderRequest,
    responses(
        (status = 201, description = "Orders created", body = BulkOrderResponse),
        (status = 400, description = "Empty, oversized or invalid batch", body = Error),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "createOrdersBulk"
)]
#[post("/orders/bulk")]
pub async fn create_orders_bulk(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<BulkOrderRequest>,
) -> ApiResult<HttpResponse> {
    let member = session.current_member(&state.auth).await?;
    let orders = state
        .procurement
        .create_bulk(&member, payload.into_inner().orders)
        .await?;
    Ok(HttpResponse::Created().json(BulkOrderResponse {
        created: orders.len(),
        orders,
    }))
}

/// One order with its approval chain and history.
#[utoipa::path(
    get,
    path = "/api/logistics/orders/{id}",
    params(("id" = u64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = ProcurementOrder),
        (status = 403, description = "Store outside scope", body = Error),
        (status = 404, description = "Unknown order", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "getOrder"
)]
#[get("/orders/{id}")]
pub async fn get_order(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<OrderId>,
) -> ApiResult<web::Json<ProcurementOrder>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.procurement.get(&member, path.into_inner()).await?))
}

/// First review step, by the logistics head.
#[utoipa::path(
    post,
    path = "/api/logistics/orders/{id}/logistics-review",
    params(("id" = u64, Path, description = "Order id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Order reviewed", body = ProcurementOrder),
        (status = 400, description = "Order not awaiting logistics review", body = Error),
        (status = 403, description = "Caller may not review", body = Error),
        (status = 404, description = "Unknown order", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "logisticsReview"
)]
#[post("/orders/{id}/logistics-review")]
pub async fn logistics_review(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<OrderId>,
    payload: web::Json<ReviewRequest>,
) -> ApiResult<web::Json<ProcurementOrder>> {
    let member = session.current_member(&state.auth).await?;
    let order = state
        .procurement
        .review_by_logistics(&member, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(order))
}

/// Final go or no-go by the senior VP.
#[utoipa::path(
    post,
    path = "/api/logistics/orders/{id}/vp-approval",
    params(("id" = u64, Path, description = "Order id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Order decided", body = ProcurementOrder),
        (status = 400, description = "Order not awaiting VP approval", body = Error),
        (status = 403, description = "Super admin access required", body = Error),
        (status = 404, description = "Unknown order", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "vpApproval"
)]
#[post("/orders/{id}/vp-approval")]
pub async fn vp_approval(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<OrderId>,
    payload: web::Json<ReviewRequest>,
) -> ApiResult<web::Json<ProcurementOrder>> {
    let member = session.current_member(&state.auth).await?;
    let order = state
        .procurement
        .decide_as_vp(&member, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(order))
}

#[utoipa::path(
    post,
    path = "/api/logistics/orders/{id}/ship",
    params(("id" = u64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order in transit", body = ProcurementOrder),
        (status = 400, description = "Order not approved", body = Error),
        (status = 403, description = "Caller may not ship", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "shipOrder"
)]
#[post("/orders/{id}/ship")]
pub async fn ship_order(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<OrderId>,
) -> ApiResult<web::Json<ProcurementOrder>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.procurement.ship(&member, path.into_inner()).await?))
}

/// Mark an order delivered and restock the destination store.
#[utoipa::path(
    post,
    path = "/api/logistics/orders/{id}/deliver",
    params(("id" = u64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order delivered", body = ProcurementOrder),
        (status = 400, description = "Order not in transit", body = Error),
        (status = 403, description = "Caller may not deliver", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "deliverOrder"
)]
#[post("/orders/{id}/deliver")]
pub async fn deliver_order(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<OrderId>,
) -> ApiResult<web::Json<ProcurementOrder>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(
        state.procurement.deliver(&member, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/logistics/orders/{id}/cancel",
    params(("id" = u64, Path, description = "Order id")),
    request_body(content = CancelRequest, description = "Optional reason"),
    responses(
        (status = 200, description = "Order cancelled", body = ProcurementOrder),
        (status = 400, description = "Order already closed", body = Error),
        (status = 403, description = "Caller may not cancel", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "cancelOrder"
)]
#[post("/orders/{id}/cancel")]
pub async fn cancel_order(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<OrderId>,
    payload: Option<web::Json<CancelRequest>>,
) -> ApiResult<web::Json<ProcurementOrder>> {
    let member = session.current_member(&state.auth).await?;
    let reason = payload.map(|body| body.into_inner().reason).unwrap_or_default();
    let order = state
        .procurement
        .cancel(&member, path.into_inner(), &reason)
        .await?;
    Ok(web::Json(order))
}

/// Staff holding the logistics head or inventory manager role.
#[utoipa::path(
    get,
    path = "/api/logistics/team",
    responses((status = 200, description = "Logistics team", body = [TeamMember])),
    tags = ["logistics"],
    operation_id = "logisticsTeam"
)]
#[get("/team")]
pub async fn team(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<TeamMember>>> {
    session.current_member(&state.auth).await?;
    Ok(web::Json(state.procurement.team().await?))
}

#[utoipa::path(
    get,
    path = "/api/logistics/approval-chain",
    responses((status = 200, description = "Approval hierarchy", body = [ChainStage])),
    tags = ["logistics"],
    operation_id = "approvalChain"
)]
#[get("/approval-chain")]
pub async fn approval_chain(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ChainStage>>> {
    session.current_member(&state.auth).await?;
    Ok(web::Json(state.procurement.approval_chain()))
}

/// Audit trail across visible orders, newest first.
#[utoipa::path(
    get,
    path = "/api/logistics/changes",
    params(LimitQuery),
    responses(
        (status = 200, description = "Change log", body = ChangeLog),
        (status = 400, description = "Limit outside 1..=100", body = Error)
    ),
    tags = ["logistics"],
    operation_id = "orderChanges"
)]
#[get("/changes")]
pub async fn changes(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<LimitQuery>,
) -> ApiResult<web::Json<ChangeLog>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(
        state.procurement.changes(&member, query.limit).await?,
    ))
}

/// Notifications targeting the caller's role, newest first.
#[utoipa::path(
    get,
    path = "/api/logistics/notifications",
    params(NotificationsQuery),
    responses(
        (status = 200, description = "Notification feed", body = NotificationFeed),
        (status = 400, description = "Limit outside 1..=200", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<NotificationsQuery>,
) -> ApiResult<web::Json<NotificationFeed>> {
    let member = session.current_member(&state.auth).await?;
    let feed = state
        .notifications
        .feed(&member, query.unread_only, query.limit)
        .await?;
    Ok(web::Json(feed))
}

#[utoipa::path(
    post,
    path = "/api/logistics/notifications/{id}/read",
    params(("id" = u64, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Unknown or invisible notification", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[post("/notifications/{id}/read")]
pub async fn mark_notification_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<NotificationId>,
) -> ApiResult<HttpResponse> {
    let member = session.current_member(&state.auth).await?;
    state
        .notifications
        .mark_read(&member, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/logistics/notifications/read-all",
    responses((status = 200, description = "Notifications marked", body = MarkedCount)),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/notifications/read-all")]
pub async fn mark_all_notifications_read(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<MarkedCount>> {
    let member = session.current_member(&state.auth).await?;
    let marked_count = state.notifications.mark_all_read(&member).await?;
    Ok(web::Json(MarkedCount { marked_count }))
}

/// Register the logistics routes on a `/logistics` scope.
///
/// Literal segments are registered before `{id}` patterns.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/logistics")
            .service(dashboard)
            .service(create_orders_bulk)
            .service(list_orders)
            .service(create_order)
            .service(get_order)
            .service(logistics_review)
            .service(vp_approval)
            .service(ship_order)
            .service(deliver_order)
            .service(cancel_order)
            .service(team)
            .service(approval_chain)
            .service(changes)
            .service(mark_all_notifications_read)
            .service(notifications)
            .service(mark_notification_read),
    );
}
