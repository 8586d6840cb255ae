//! Raw sales history under `/api/history`.
//!
//! ```text
//! GET /?from&to&store_id&item_id&limit&offset
//! GET /range
//! GET /stores
//! GET /items
//! ```

use actix_web::{get, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    Error, HistoryItems, HistoryPage, HistoryQuery, HistoryRange, HistoryStores, ItemId, StoreId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// First day, inclusive.
    pub from: Option<NaiveDate>,
    /// Last day, inclusive.
    pub to: Option<NaiveDate>,
    pub store_id: Option<StoreId>,
    pub item_id: Option<ItemId>,
    #[param(minimum = 1, maximum = 1000)]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<HistoryParams> for HistoryQuery {
    fn from(params: HistoryParams) -> Self {
        Self {
            from: params.from,
            to: params.to,
            store_id: params.store_id,
            item_id: params.item_id,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

/// Daily store/item rows, newest day first.
#[utoipa::path(
    get,
    path = "/api/history",
    params(HistoryParams),
    responses(
        (status = 200, description = "A page of history rows", body = HistoryPage),
        (status = 400, description = "Limit outside 1..=1000 or from after to", body = Error),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["history"],
    operation_id = "listHistory"
)]
#[get("")]
pub async fn list(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<HistoryParams>,
) -> ApiResult<web::Json<HistoryPage>> {
    let member = session.current_member(&state.auth).await?;
    let query = HistoryQuery::from(query.into_inner());
    Ok(web::Json(state.analytics.history(&member, &query).await?))
}

#[utoipa::path(
    get,
    path = "/api/history/range",
    responses((status = 200, description = "First and last recorded day", body = HistoryRange)),
    tags = ["history"],
    operation_id = "historyRange"
)]
#[get("/range")]
pub async fn range(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<HistoryRange>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.analytics.history_range(&member).await?))
}

#[utoipa::path(
    get,
    path = "/api/history/stores",
    responses((status = 200, description = "Stores in scope", body = HistoryStores)),
    tags = ["history"],
    operation_id = "historyStores"
)]
#[get("/stores")]
pub async fn stores(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<HistoryStores>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.analytics.history_stores(&member).await?))
}

#[utoipa::path(
    get,
    path = "/api/history/items",
    responses((status = 200, description = "The catalogue", body = HistoryItems)),
    tags = ["history"],
    operation_id = "historyItems"
)]
#[get("/items")]
pub async fn items(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<HistoryItems>> {
    session.current_member(&state.auth).await?;
    Ok(web::Json(state.analytics.history_items().await?))
}

/// Register the history routes on a `/history` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/history")
            .service(list)
            .service(range)
            .service(stores)
            .service(items),
    );
}
