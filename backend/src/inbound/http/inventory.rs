//! Stock positions and store-to-store transfers under `/api/inventory`.
//!
//! ```text
//! GET  /summary?store_id
//! GET  /items?store_id&category&status&search&page&limit
//! GET  /low-stock?store_id&limit
//! GET  /categories
//! GET  /stores/{store_id}?category
//! GET  /transfers?status&page&limit
//! POST /transfer
//! GET  /analytics?days
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    CategoryInventory, Error, InventoryFilter, InventoryItem, InventoryMovement, InventorySummary,
    LowStockReport, Page, PageRequest, StockStatus, StoreId, StoreInventory, Transfer, TransferRequest,
    TransferStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::pages::TransferPage;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const DEFAULT_ITEMS_LIMIT: u32 = 50;
const DEFAULT_TRANSFERS_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StoreQuery {
    pub store_id: Option<StoreId>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemsQuery {
    pub store_id: Option<StoreId>,
    pub category: Option<String>,
    pub status: Option<StockStatus>,
    /// Case-insensitive substring of the item name.
    pub search: Option<String>,
    #[param(minimum = 1)]
    pub page: Option<u32>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    pub store_id: Option<StoreId>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransfersQuery {
    pub status: Option<TransferStatus>,
    #[param(minimum = 1)]
    pub page: Option<u32>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<u32>,
}

/// Totals and status counts across visible stores or one store.
#[utoipa::path(
    get,
    path = "/api/inventory/summary",
    params(StoreQuery),
    responses(
        (status = 200, description = "Inventory summary", body = InventorySummary),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "inventorySummary"
)]
#[get("/summary")]
pub async fn summary(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<StoreQuery>,
) -> ApiResult<web::Json<InventorySummary>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(
        state.inventory.summary(&member, query.store_id).await?,
    ))
}

/// Stock positions, out-of-stock first.
#[utoipa::path(
    get,
    path = "/api/inventory/items",
    params(ItemsQuery),
    responses(
        (status = 200, description = "Item page", body = Page<InventoryItem>),
        (status = 400, description = "Invalid filter or paging", body = Error),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "inventoryItems"
)]
#[get("/items")]
pub async fn items(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ItemsQuery>,
) -> ApiResult<web::Json<Page<InventoryItem>>> {
    let member = session.current_member(&state.auth).await?;
    let ItemsQuery {
        store_id,
        category,
        status,
        search,
        page,
        limit,
    } = query.into_inner();
    let page = PageRequest::new(page, limit, DEFAULT_ITEMS_LIMIT, MAX_LIMIT)?;
    let filter = InventoryFilter {
        store_id,
        category,
        status,
        search,
    };
    Ok(web::Json(state.inventory.items(&member, &filter, page).await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Low and out-of-stock items", body = LowStockReport),
        (status = 400, description = "Limit outside 1..=100", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "lowStock"
)]
#[get("/low-stock")]
pub async fn low_stock(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<LowStockQuery>,
) -> ApiResult<web::Json<LowStockReport>> {
    let member = session.current_member(&state.auth).await?;
    let report = state
        .inventory
        .low_stock(&member, query.store_id, query.limit)
        .await?;
    Ok(web::Json(report))
}

#[utoipa::path(
    get,
    path = "/api/inventory/categories",
    responses((status = 200, description = "Per-category totals", body = [CategoryInventory])),
    tags = ["inventory"],
    operation_id = "inventoryCategories"
)]
#[get("/categories")]
pub async fn categories(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<CategoryInventory>>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.inventory.categories(&member).await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/stores/{store_id}",
    params(("store_id" = u32, Path, description = "Store id"), CategoryQuery),
    responses(
        (status = 200, description = "Store inventory", body = StoreInventory),
        (status = 403, description = "Store outside scope", body = Error),
        (status = 404, description = "Unknown store", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "storeInventory"
)]
#[get("/stores/{store_id}")]
pub async fn store(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<StoreId>,
    query: web::Query<CategoryQuery>,
) -> ApiResult<web::Json<StoreInventory>> {
    let member = session.current_member(&state.auth).await?;
    let inventory = state
        .inventory
        .store(&member, path.into_inner(), query.into_inner().category)
        .await?;
    Ok(web::Json(inventory))
}

#[utoipa::path(
    get,
    path = "/api/inventory/transfers",
    params(TransfersQuery),
    responses(
        (status = 200, description = "Transfer page", body = TransferPage),
        (status = 400, description = "Invalid paging", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "listTransfers"
)]
#[get("/transfers")]
pub async fn transfers(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<TransfersQuery>,
) -> ApiResult<web::Json<TransferPage>> {
    let member = session.current_member(&state.auth).await?;
    let TransfersQuery {
        status,
        page,
        limit,
    } = query.into_inner();
    let page = PageRequest::new(page, limit, DEFAULT_TRANSFERS_LIMIT, MAX_LIMIT)?;
    let transfers = state.inventory.transfers(&member, status, page).await?;
    Ok(web::Json(transfers.into()))
}

/// Move stock between two stores.
#[utoipa::path(
    post,
    path = "/api/inventory/transfer",
    request_body = TransferRequest,
    responses(
        (status = 201, description = "Transfer completed", body = Transfer),
        (status = 400, description = "Same store, zero quantity or short stock", body = Error),
        (status = 403, description = "Caller may not move stock between these stores", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "createTransfer"
)]
#[post("/transfer")]
pub async fn create_transfer(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TransferRequest>,
) -> ApiResult<HttpResponse> {
    let member = session.current_member(&state.auth).await?;
    let transfer = state
        .inventory
        .transfer(&member, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(transfer))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovementQuery {
    #[param(minimum = 7, maximum = 90)]
    pub days: Option<u32>,
}

/// Units sold per day and per category, from the sales history.
#[utoipa::path(
    get,
    path = "/api/inventory/analytics",
    params(MovementQuery),
    responses(
        (status = 200, description = "Stock movement", body = InventoryMovement),
        (status = 400, description = "Days outside 7..=90", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "inventoryAnalytics"
)]
#[get("/analytics")]
pub async fn analytics(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<MovementQuery>,
) -> ApiResult<web::Json<InventoryMovement>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(
        state.analytics.inventory_movement(&member, query.days).await?,
    ))
}

/// Register the inventory routes on an `/inventory` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/inventory")
            .service(summary)
            .service(items)
            .service(low_stock)
            .service(categories)
            .service(store)
            .service(transfers)
            .service(create_transfer)
            .service(analytics),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::inbound::http::auth::login;
    use crate::inbound::http::test_utils::{TestState, login_as, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::{Value, json};

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
            .service(web::scope("/api").service(login).configure(configure))
    }

    #[actix_web::test]
    async fn items_put_the_emptiest_first() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::SuperAdmin).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/inventory/items?limit=100")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let page: Page<InventoryItem> = test::read_body_json(res).await;
        let ranks: Vec<u8> = page.items.iter().map(|item| item.status.urgency()).collect();
        assert!(ranks.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[actix_web::test]
    async fn store_manager_is_kept_to_their_store() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::StoreManager).await;
        let manager = fixture
            .demo
            .staff
            .iter()
            .find(|member| member.role == Role::StoreManager)
            .expect("store manager");
        let foreign = fixture
            .demo
            .stores
            .iter()
            .find(|candidate| !manager.scope.contains(candidate.id))
            .expect("store outside scope");
        for uri in [
            format!("/api/inventory/summary?store_id={}", foreign.id),
            format!("/api/inventory/stores/{}", foreign.id),
            format!("/api/inventory/low-stock?store_id={}", foreign.id),
        ] {
            let res = test::call_service(
                &app,
                test::TestRequest::get()
                    .uri(&uri)
                    .cookie(cookie.clone())
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[actix_web::test]
    async fn transfer_moves_stock_and_is_listed() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::SuperAdmin).await;
        let from = fixture.demo.stores[0].id;
        let to = fixture.demo.stores[1].id;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/inventory/items?store_id={from}&status=in_stock&limit=1"))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        let page: Page<InventoryItem> = test::read_body_json(res).await;
        let item = page.items.first().expect("an item in stock");

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/inventory/transfer")
                .cookie(cookie.clone())
                .set_json(json!({
                    "from_store_id": from,
                    "to_store_id": to,
                    "item_id": item.item_id,
                    "quantity": 1,
                    "reason": "rebalance",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let transfer: Transfer = test::read_body_json(res).await;
        assert_eq!(transfer.status, TransferStatus::Completed);

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/inventory/transfers?status=completed")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let page: TransferPage = test::read_body_json(res).await;
        assert_eq!(page.total, 1);
        assert_eq!(page.transfers[0].id, transfer.id);
    }

    #[rstest]
    #[case(Role::Analyst, json!({"from_store_id": 1, "to_store_id": 2, "item_id": 1, "quantity": 1}), StatusCode::FORBIDDEN)]
    #[case(Role::SuperAdmin, json!({"from_store_id": 1, "to_store_id": 1, "item_id": 1, "quantity": 1}), StatusCode::BAD_REQUEST)]
    #[case(Role::SuperAdmin, json!({"from_store_id": 1, "to_store_id": 2, "item_id": 1, "quantity": 0}), StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn invalid_transfers_are_refused(
        #[case] role: Role,
        #[case] body: Value,
        #[case] expected: StatusCode,
    ) {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, role).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/inventory/transfer")
                .cookie(cookie)
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn categories_need_a_session() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/inventory/categories")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(None, StatusCode::OK)]
    #[case(Some(6), StatusCode::BAD_REQUEST)]
    #[case(Some(91), StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn movement_window_is_bounded(#[case] days: Option<u32>, #[case] expected: StatusCode) {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::InventoryManager).await;
        let uri = days.map_or_else(
            || "/api/inventory/analytics".to_owned(),
            |days| format!("/api/inventory/analytics?days={days}"),
        );
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(&uri).cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
        if expected == StatusCode::OK {
            let movement: InventoryMovement = test::read_body_json(res).await;
            assert_eq!(movement.period_days, 30);
            let daily: u64 = movement.daily_trend.iter().map(|day| day.total_units).sum();
            assert_eq!(daily, movement.total_movement);
            assert!(movement.top_categories.len() <= 10);
        }
    }
}
