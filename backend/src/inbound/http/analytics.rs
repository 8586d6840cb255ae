//! Dashboard KPIs and executive charts.
//!
//! ```text
//! GET /kpis
//! GET /analytics/trend?days&include_forecast
//! GET /analytics/stores
//! GET /analytics/top-items?limit
//! GET /analytics/categories
//! GET /analytics/streaming-trend
//! GET /analytics/summary
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    AnalyticsSummary, CategoryBreakdown, Error, Kpis, SalesForecast, StoreDistribution,
    StreamingTrend, TopItems,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ForecastQuery {
    #[param(minimum = 7, maximum = 365)]
    pub days: Option<u32>,
    /// Append a week of projections; defaults to `true`.
    pub include_forecast: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopItemsQuery {
    #[param(minimum = 5, maximum = 50)]
    pub limit: Option<u32>,
}

/// Record counts, period totals and the weekly trend.
#[utoipa::path(
    get,
    path = "/api/kpis",
    responses(
        (status = 200, description = "Key performance indicators", body = Kpis),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["analytics"],
    operation_id = "kpis"
)]
#[get("/kpis")]
pub async fn kpis(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Kpis>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.analytics.kpis(&member).await?))
}

/// Recorded days followed by a week of projections.
#[utoipa::path(
    get,
    path = "/api/analytics/trend",
    params(ForecastQuery),
    responses(
        (status = 200, description = "Daily units with projections", body = SalesForecast),
        (status = 400, description = "Days outside 7..=365", body = Error)
    ),
    tags = ["analytics"],
    operation_id = "analyticsTrend"
)]
#[get("/trend")]
pub async fn trend(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ForecastQuery>,
) -> ApiResult<web::Json<SalesForecast>> {
    let member = session.current_member(&state.auth).await?;
    let ForecastQuery {
        days,
        include_forecast,
    } = query.into_inner();
    let forecast = state
        .analytics
        .sales_forecast(&member, days, include_forecast.unwrap_or(true))
        .await?;
    Ok(web::Json(forecast))
}

#[utoipa::path(
    get,
    path = "/api/analytics/stores",
    responses((status = 200, description = "Units per store", body = StoreDistribution)),
    tags = ["analytics"],
    operation_id = "analyticsStores"
)]
#[get("/stores")]
pub async fn stores(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StoreDistribution>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.analytics.store_distribution(&member).await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/top-items",
    params(TopItemsQuery),
    responses(
        (status = 200, description = "Best sellers", body = TopItems),
        (status = 400, description = "Limit outside 5..=50", body = Error)
    ),
    tags = ["analytics"],
    operation_id = "analyticsTopItems"
)]
#[get("/top-items")]
pub async fn top_items(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<TopItemsQuery>,
) -> ApiResult<web::Json<TopItems>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.analytics.top_items(&member, query.limit).await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/categories",
    responses((status = 200, description = "Units per category", body = CategoryBreakdown)),
    tags = ["analytics"],
    operation_id = "analyticsCategories"
)]
#[get("/categories")]
pub async fn categories(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<CategoryBreakdown>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.analytics.categories(&member).await?))
}

/// Buffered live sales with a running total.
#[utoipa::path(
    get,
    path = "/api/analytics/streaming-trend",
    responses((status = 200, description = "Live sales, oldest first", body = StreamingTrend)),
    tags = ["analytics"],
    operation_id = "analyticsStreamingTrend"
)]
#[get("/streaming-trend")]
pub async fn streaming_trend(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StreamingTrend>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.analytics.streaming_trend(&member).await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    responses((status = 200, description = "Every chart in one read", body = AnalyticsSummary)),
    tags = ["analytics"],
    operation_id = "analyticsSummary"
)]
#[get("/summary")]
pub async fn summary(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AnalyticsSummary>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.analytics.summary(&member).await?))
}

/// Register `/kpis` and the `/analytics` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(kpis).service(
        web::scope("/analytics")
            .service(trend)
            .service(stores)
            .service(top_items)
            .service(categories)
            .service(streaming_trend)
            .service(summary),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::inbound::http::auth::login;
    use crate::inbound::http::test_utils::{TestState, login_as, test_session_middleware};
    use crate::test_support::FixtureClock;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::Value;

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
    async fn kpis_cover_the_generated_history() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::SuperAdmin).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/kpis").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let headline: Kpis = test::read_body_json(res).await;
        assert_eq!(headline.total_historical_records, fixture.demo.sales.len());
        assert_eq!(
            headline.data_range_end,
            Some(FixtureClock::default_instant().date_naive())
        );
        assert_eq!(headline.total_streaming_records, 0);
    }

    #[actix_web::test]
    async fn kpis_require_a_session() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/kpis").to_request())
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn trend_appends_a_projected_week() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::Analyst).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics/trend?days=14")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let chart: SalesForecast = test::read_body_json(res).await;
        assert_eq!(chart.days, 14);
        assert_eq!(chart.data.len(), 21);
        assert!(chart.data[..14].iter().all(|point| point.sales.is_some()));
        assert!(chart.data[14..].iter().all(|point| point.forecast.is_some()));
    }

    #[rstest]
    #[case("/api/analytics/stores", "data")]
    #[case("/api/analytics/top-items?limit=5", "data")]
    #[case("/api/analytics/categories", "data")]
    #[case("/api/analytics/streaming-trend", "data")]
    #[case("/api/analytics/summary", "sales_trend")]
    #[actix_web::test]
    async fn charts_answer_under_their_series_key(#[case] uri: &str, #[case] key: &str) {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::SuperAdmin).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(uri).cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK, "{uri}");
        let body: Value = test::read_body_json(res).await;
        assert!(body[key].is_array(), "{uri} lacks {key}");
    }

    #[actix_web::test]
    async fn store_managers_only_see_their_store_split() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let manager = fixture
            .demo
            .staff
            .iter()
            .find(|member| member.role == Role::StoreManager)
            .expect("store manager")
            .clone();
        let cookie = login_as(&app, &fixture, Role::StoreManager).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics/stores")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let split: StoreDistribution = test::read_body_json(res).await;
        assert!(!split.data.is_empty());
        assert!(split.data.iter().all(|share| manager.scope.contains(share.store_id)));
    }

    #[actix_web::test]
    async fn top_items_limit_is_bounded() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::Analyst).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics/top-items?limit=4")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
