//! Sales analytics under `/api/sales`.
//!
//! ```text
//! GET /latest?limit
//! GET /metrics?store_id
//! GET /trend?days&store_id
//! GET /predictions?store_id&item_id&days
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{Error, ItemId, Prediction, SaleEvent, SalesMetrics, StoreId, TrendPoint};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestQuery {
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MetricsQuery {
    pub store_id: Option<StoreId>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendQuery {
    #[param(minimum = 7, maximum = 90)]
    pub days: Option<u32>,
    pub store_id: Option<StoreId>,
}

/// Most recent live sales, newest first.
#[utoipa::path(
    get,
    path = "/api/sales/latest",
    params(LatestQuery),
    responses(
        (status = 200, description = "Latest sales", body = [SaleEvent]),
        (status = 400, description = "Limit outside 1..=100", body = Error)
    ),
    tags = ["sales"],
    operation_id = "latestSales"
)]
#[get("/latest")]
pub async fn latest(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<LatestQuery>,
) -> ApiResult<web::Json<Vec<SaleEvent>>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.sales.latest(&member, query.limit).await?))
}

/// Today's units and revenue, active stores and the top item.
#[utoipa::path(
    get,
    path = "/api/sales/metrics",
    params(MetricsQuery),
    responses(
        (status = 200, description = "Headline figures", body = SalesMetrics),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["sales"],
    operation_id = "salesMetrics"
)]
#[get("/metrics")]
pub async fn metrics(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<MetricsQuery>,
) -> ApiResult<web::Json<SalesMetrics>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.sales.metrics(&member, query.store_id).await?))
}

/// Daily units and revenue, oldest first.
#[utoipa::path(
    get,
    path = "/api/sales/trend",
    params(TrendQuery),
    responses(
        (status = 200, description = "Daily totals", body = [TrendPoint]),
        (status = 400, description = "Days outside 7..=90", body = Error),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["sales"],
    operation_id = "salesTrend"
)]
#[get("/trend")]
pub async fn trend(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<TrendQuery>,
) -> ApiResult<web::Json<Vec<TrendPoint>>> {
    let member = session.current_member(&state.auth).await?;
    let TrendQuery { days, store_id } = query.into_inner();
    Ok(web::Json(state.sales.trend(&member, days, store_id).await?))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PredictionQuery {
    /// Defaults to store 1.
    pub store_id: Option<StoreId>,
    /// Defaults to item 1.
    pub item_id: Option<ItemId>,
    #[param(minimum = 1, maximum = 90)]
    pub days: Option<u32>,
}

/// Daily forecast for one item at one store.
#[utoipa::path(
    get,
    path = "/api/sales/predictions",
    params(PredictionQuery),
    responses(
        (status = 200, description = "Projected days with a 95% band", body = [Prediction]),
        (status = 400, description = "Days outside 1..=90", body = Error),
        (status = 403, description = "Store outside scope", body = Error),
        (status = 404, description = "Less than a week of history", body = Error)
    ),
    tags = ["sales"],
    operation_id = "salesPredictions"
)]
#[get("/predictions")]
pub async fn predictions(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PredictionQuery>,
) -> ApiResult<web::Json<Vec<Prediction>>> {
    let member = session.current_member(&state.auth).await?;
    let PredictionQuery {
        store_id,
        item_id,
        days,
    } = query.into_inner();
    let forecast = state
        .analytics
        .predictions(&member, store_id.unwrap_or(1), item_id.unwrap_or(1), days)
        .await?;
    Ok(web::Json(forecast))
}

/// Register the sales routes on a `/sales` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sales")
            .service(latest)
            .service(metrics)
            .service(trend)
            .service(predictions),
    );
}
