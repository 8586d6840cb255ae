//! Operational alerts and alert rules under `/api/alerts`.
//!
//! ```text
//! GET    /summary
//! GET    /list?status&severity&alert_type&store_id&page&limit
//! GET    /recent?limit
//! POST   /scan
//! POST   /{id}/acknowledge      POST /{id}/resolve
//! GET    /rules                 POST /rules
//! PUT    /rules/{id}            DELETE /rules/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    Alert, AlertFilter, AlertId, AlertList, AlertRule, AlertRuleId, AlertRuleRequest, AlertRules,
    AlertSeverity, AlertStatus, AlertSummary, AlertType, Error, PageRequest, StoreId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::pages::AlertPage;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const DEFAULT_ALERTS_LIMIT: u32 = 20;
const MAX_ALERTS_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertsQuery {
    pub status: Option<AlertStatus>,
    pub severity: Option<AlertSeverity>,
    pub alert_type: Option<AlertType>,
    pub store_id: Option<StoreId>,
    #[param(minimum = 1)]
    pub page: Option<u32>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    #[param(minimum = 1, maximum = 50)]
    pub limit: Option<u32>,
}

/// Active counts per severity.
#[utoipa::path(
    get,
    path = "/api/alerts/summary",
    responses((status = 200, description = "Alert summary", body = AlertSummary)),
    tags = ["alerts"],
    operation_id = "alertSummary"
)]
#[get("/summary")]
pub async fn summary(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AlertSummary>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.alerts.summary(&member).await?))
}

#[utoipa::path(
    get,
    path = "/api/alerts/list",
    params(AlertsQuery),
    responses(
        (status = 200, description = "Alert page, newest first", body = AlertPage),
        (status = 400, description = "Invalid filter or paging", body = Error),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "listAlerts"
)]
#[get("/list")]
pub async fn list(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<AlertsQuery>,
) -> ApiResult<web::Json<AlertPage>> {
    let member = session.current_member(&state.auth).await?;
    let AlertsQuery {
        status,
        severity,
        alert_type,
        store_id,
        page,
        limit,
    } = query.into_inner();
    let page = PageRequest::new(page, limit, DEFAULT_ALERTS_LIMIT, MAX_ALERTS_LIMIT)?;
    let filter = AlertFilter {
        status,
        severity,
        alert_type,
        store_id,
    };
    let alerts = state.alerts.list(&member, &filter, page).await?;
    Ok(web::Json(alerts.into()))
}

/// Newest unresolved alerts.
#[utoipa::path(
    get,
    path = "/api/alerts/recent",
    params(RecentQuery),
    responses(
        (status = 200, description = "Unresolved alerts", body = AlertList),
        (status = 400, description = "Limit outside 1..=50", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "recentAlerts"
)]
#[get("/recent")]
pub async fn recent(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<RecentQuery>,
) -> ApiResult<web::Json<AlertList>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.alerts.recent(&member, query.limit).await?))
}

/// Run detection now instead of waiting for the live feed.
#[utoipa::path(
    post,
    path = "/api/alerts/scan",
    responses(
        (status = 200, description = "Alerts raised by this scan", body = AlertList),
        (status = 403, description = "Caller may not manage alert rules", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "scanAlerts"
)]
#[post("/scan")]
pub async fn scan(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AlertList>> {
    let member = session.current_member(&state.auth).await?;
    if !member.permissions().can_manage_alert_rules {
        return Err(Error::forbidden("not authorised to run alert detection"));
    }
    let raised = state.alerts.scan().await?;
    let alerts: Vec<Alert> = raised
        .into_iter()
        .filter(|alert| alert.visible_to(&member))
        .collect();
    Ok(web::Json(AlertList {
        total: alerts.len(),
        alerts,
    }))
}

#[utoipa::path(
    post,
    path = "/api/alerts/{id}/acknowledge",
    params(("id" = u64, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert acknowledged", body = Alert),
        (status = 400, description = "Alert is not active", body = Error),
        (status = 404, description = "Unknown alert", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "acknowledgeAlert"
)]
#[post("/{id}/acknowledge")]
pub async fn acknowledge(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<AlertId>,
) -> ApiResult<web::Json<Alert>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(
        state.alerts.acknowledge(&member, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/alerts/{id}/resolve",
    params(("id" = u64, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert resolved", body = Alert),
        (status = 400, description = "Alert already resolved", body = Error),
        (status = 404, description = "Unknown alert", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "resolveAlert"
)]
#[post("/{id}/resolve")]
pub async fn resolve(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<AlertId>,
) -> ApiResult<web::Json<Alert>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(
        state.alerts.resolve(&member, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/alerts/rules",
    responses((status = 200, description = "Alert rules", body = AlertRules)),
    tags = ["alerts"],
    operation_id = "listAlertRules"
)]
#[get("/rules")]
pub async fn rules(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AlertRules>> {
    session.current_member(&state.auth).await?;
    Ok(web::Json(state.alerts.rules().await?))
}

#[utoipa::path(
    post,
    path = "/api/alerts/rules",
    request_body = AlertRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = AlertRule),
        (status = 400, description = "Invalid rule", body = Error),
        (status = 403, description = "Caller may not manage alert rules", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "createAlertRule"
)]
#[post("/rules")]
pub async fn create_rule(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AlertRuleRequest>,
) -> ApiResult<HttpResponse> {
    let member = session.current_member(&state.auth).await?;
    let rule = state
        .alerts
        .create_rule(&member, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(rule))
}

#[utoipa::path(
    put,
    path = "/api/alerts/rules/{id}",
    params(("id" = u64, Path, description = "Rule id")),
    request_body = AlertRuleRequest,
    responses(
        (status = 200, description = "Rule replaced", body = AlertRule),
        (status = 403, description = "Caller may not manage alert rules", body = Error),
        (status = 404, description = "Unknown rule", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "updateAlertRule"
)]
#[put("/rules/{id}")]
pub async fn update_rule(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<AlertRuleId>,
    payload: web::Json<AlertRuleRequest>,
) -> ApiResult<web::Json<AlertRule>> {
    let member = session.current_member(&state.auth).await?;
    let rule = state
        .alerts
        .update_rule(&member, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(rule))
}

#[utoipa::path(
    delete,
    path = "/api/alerts/rules/{id}",
    params(("id" = u64, Path, description = "Rule id")),
    responses(
        (status = 204, description = "Rule deleted"),
        (status = 403, description = "Caller may not manage alert rules", body = Error),
        (status = 404, description = "Unknown rule", body = Error)
    ),
    tags = ["alerts"],
    operation_id = "deleteAlertRule"
)]
#[delete("/rules/{id}")]
pub async fn delete_rule(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<AlertRuleId>,
) -> ApiResult<HttpResponse> {
    let member = session.current_member(&state.auth).await?;
    state.alerts.delete_rule(&member, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register the alert routes on an `/alerts` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/alerts")
            .service(summary)
            .service(list)
            .service(recent)
            .service(scan)
            .service(rules)
            .service(create_rule)
            .service(update_rule)
            .service(delete_rule)
            .service(acknowledge)
            .service(resolve),
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

    fn rule_body() -> Value {
        json!({
            "name": "Chilled stock floor",
            "rule_type": "low_stock",
            "condition": { "threshold": 40, "unit": "units" },
            "action": "notify",
            "severity": "warning",
        })
    }

    #[actix_web::test]
    async fn scanned_alerts_follow_their_lifecycle() {
        let fixture = TestState::new();
        fixture.drain_stock().await;
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::SuperAdmin).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/alerts/scan")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let raised: AlertList = test::read_body_json(res).await;
        let alert = raised.alerts.first().expect("drained stock raises an alert");

        let call = |uri: String| {
            test::TestRequest::post()
                .uri(&uri)
                .cookie(cookie.clone())
                .to_request()
        };
        let res = test::call_service(&app, call(format!("/api/alerts/{}/acknowledge", alert.id))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let acknowledged: Alert = test::read_body_json(res).await;
        assert_eq!(acknowledged.status, AlertStatus::Acknowledged);

        let res = test::call_service(&app, call(format!("/api/alerts/{}/acknowledge", alert.id))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"]["code"], "invalid_transition");

        let res = test::call_service(&app, call(format!("/api/alerts/{}/resolve", alert.id))).await;
        let resolved: Alert = test::read_body_json(res).await;
        assert_eq!(resolved.status, AlertStatus::Resolved);

        let res = test::call_service(&app, call(format!("/api/alerts/{}/resolve", alert.id))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn a_second_scan_does_not_duplicate_open_alerts() {
        let fixture = TestState::new();
        fixture.drain_stock().await;
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::SuperAdmin).await;
        let scan_request = || {
            test::TestRequest::post()
                .uri("/api/alerts/scan")
                .cookie(cookie.clone())
                .to_request()
        };
        let first: AlertList = test::read_body_json(test::call_service(&app, scan_request()).await).await;
        assert!(first.total > 0);
        let second: AlertList = test::read_body_json(test::call_service(&app, scan_request()).await).await;
        assert_eq!(second.total, 0);
    }

    #[actix_web::test]
    async fn rule_crud_for_regional_managers() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::RegionalManager).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/alerts/rules")
                .cookie(cookie.clone())
                .set_json(rule_body())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let rule: AlertRule = test::read_body_json(res).await;

        let mut replacement = rule_body();
        replacement["is_active"] = json!(false);
        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/alerts/rules/{}", rule.id))
                .cookie(cookie.clone())
                .set_json(replacement)
                .to_request(),
        )
        .await;
        let updated: AlertRule = test::read_body_json(res).await;
        assert!(!updated.is_active);
        assert_eq!(updated.created_at, rule.created_at);

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/alerts/rules/{}", rule.id))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/alerts/rules/{}", rule.id))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[case(Role::StoreManager)]
    #[case(Role::Analyst)]
    #[actix_web::test]
    async fn rule_changes_need_permission(#[case] role: Role) {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, role).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/alerts/rules")
                .cookie(cookie.clone())
                .set_json(rule_body())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/alerts/scan")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn recent_limit_is_bounded() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::Analyst).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/alerts/recent?limit=51")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
