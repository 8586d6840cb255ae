//! Period reports under `/api/reports`.
//!
//! ```text
//! GET /sales?days&store_id
//! GET /inventory
//! GET /performance?days
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{Error, InventoryReport, PerformanceReport, SalesReport, StoreId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesReportQuery {
    #[param(minimum = 1, maximum = 365)]
    pub days: Option<u32>,
    pub store_id: Option<StoreId>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PerformanceQuery {
    #[param(minimum = 1, maximum = 365)]
    pub days: Option<u32>,
}

/// Totals, daily series and splits for the last `days` days (default 7).
#[utoipa::path(
    get,
    path = "/api/reports/sales",
    params(SalesReportQuery),
    responses(
        (status = 200, description = "Sales report", body = SalesReport),
        (status = 400, description = "Days outside 1..=365", body = Error),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["reports"],
    operation_id = "salesReport"
)]
#[get("/sales")]
pub async fn sales(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<SalesReportQuery>,
) -> ApiResult<web::Json<SalesReport>> {
    let member = session.current_member(&state.auth).await?;
    let SalesReportQuery { days, store_id } = query.into_inner();
    Ok(web::Json(
        state.analytics.sales_report(&member, days, store_id).await?,
    ))
}

/// Stock per category.
#[utoipa::path(
    get,
    path = "/api/reports/inventory",
    responses((status = 200, description = "Inventory report", body = InventoryReport)),
    tags = ["reports"],
    operation_id = "inventoryReport"
)]
#[get("/inventory")]
pub async fn inventory(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<InventoryReport>> {
    let member = session.current_member(&state.auth).await?;
    let categories = state.inventory.categories(&member).await?;
    Ok(web::Json(InventoryReport { categories }))
}

/// Per-store units against the preceding period (default 30 days).
#[utoipa::path(
    get,
    path = "/api/reports/performance",
    params(PerformanceQuery),
    responses(
        (status = 200, description = "Store comparison", body = PerformanceReport),
        (status = 400, description = "Days outside 1..=365", body = Error)
    ),
    tags = ["reports"],
    operation_id = "performanceReport"
)]
#[get("/performance")]
pub async fn performance(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PerformanceQuery>,
) -> ApiResult<web::Json<PerformanceReport>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(
        state.analytics.performance_report(&member, query.days).await?,
    ))
}

/// Register the report routes on a `/reports` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reports")
            .service(sales)
            .service(inventory)
            .service(performance),
    );
}
