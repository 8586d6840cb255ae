//! Promotion campaigns under `/api/promotions`.
//!
//! ```text
//! GET    /summary
//! GET    /active?store_id&category
//! GET    /list?status&category&page&limit
//! GET    /suggestions
//! POST   /create
//! GET    /{id}     PUT /{id}     DELETE /{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    ActivePromotions, CreatePromotionRequest, Error, PageRequest, Promotion, PromotionFilter,
    PromotionId, PromotionStatus, PromotionSuggestions, PromotionSummary, StoreId,
    UpdatePromotionRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::pages::PromotionPage;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const DEFAULT_PROMOTIONS_LIMIT: u32 = 20;
const MAX_PROMOTIONS_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActiveQuery {
    pub store_id: Option<StoreId>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PromotionsQuery {
    pub status: Option<PromotionStatus>,
    pub category: Option<String>,
    #[param(minimum = 1)]
    pub page: Option<u32>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/promotions/summary",
    responses((status = 200, description = "Counts per status and redemption totals", body = PromotionSummary)),
    tags = ["promotions"],
    operation_id = "promotionSummary"
)]
#[get("/summary")]
pub async fn summary(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PromotionSummary>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.promotions.summary(&member).await?))
}

/// Promotions running today.
#[utoipa::path(
    get,
    path = "/api/promotions/active",
    params(ActiveQuery),
    responses(
        (status = 200, description = "Running promotions", body = ActivePromotions),
        (status = 403, description = "Store outside scope", body = Error)
    ),
    tags = ["promotions"],
    operation_id = "activePromotions"
)]
#[get("/active")]
pub async fn active(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ActiveQuery>,
) -> ApiResult<web::Json<ActivePromotions>> {
    let member = session.current_member(&state.auth).await?;
    let ActiveQuery { store_id, category } = query.into_inner();
    let promotions = state
        .promotions
        .active(&member, store_id, category.as_deref())
        .await?;
    Ok(web::Json(promotions))
}

#[utoipa::path(
    get,
    path = "/api/promotions/list",
    params(PromotionsQuery),
    responses(
        (status = 200, description = "Promotion page", body = PromotionPage),
        (status = 400, description = "Invalid paging", body = Error)
    ),
    tags = ["promotions"],
    operation_id = "listPromotions"
)]
#[get("/list")]
pub async fn list(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PromotionsQuery>,
) -> ApiResult<web::Json<PromotionPage>> {
    let member = session.current_member(&state.auth).await?;
    let PromotionsQuery {
        status,
        category,
        page,
        limit,
    } = query.into_inner();
    let page = PageRequest::new(page, limit, DEFAULT_PROMOTIONS_LIMIT, MAX_PROMOTIONS_LIMIT)?;
    let filter = PromotionFilter { status, category };
    let promotions = state.promotions.list(&member, &filter, page).await?;
    Ok(web::Json(promotions.into()))
}

/// Discount ideas for items selling well below their category.
#[utoipa::path(
    get,
    path = "/api/promotions/suggestions",
    responses((status = 200, description = "Suggested discounts", body = PromotionSuggestions)),
    tags = ["promotions"],
    operation_id = "promotionSuggestions"
)]
#[get("/suggestions")]
pub async fn suggestions(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PromotionSuggestions>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.promotions.suggestions(&member).await?))
}

#[utoipa::path(
    post,
    path = "/api/promotions/create",
    request_body = CreatePromotionRequest,
    responses(
        (status = 201, description = "Promotion created", body = Promotion),
        (status = 400, description = "Invalid promotion", body = Error),
        (status = 403, description = "Caller may not manage promotions here", body = Error)
    ),
    tags = ["promotions"],
    operation_id = "createPromotion"
)]
#[post("/create")]
pub async fn create(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreatePromotionRequest>,
) -> ApiResult<HttpResponse> {
    let member = session.current_member(&state.auth).await?;
    let promotion = state
        .promotions
        .create(&member, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(promotion))
}

#[utoipa::path(
    get,
    path = "/api/promotions/{id}",
    params(("id" = u64, Path, description = "Promotion id")),
    responses(
        (status = 200, description = "Promotion", body = Promotion),
        (status = 404, description = "Unknown or invisible promotion", body = Error)
    ),
    tags = ["promotions"],
    operation_id = "getPromotion"
)]
#[get("/{id}")]
pub async fn get_promotion(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<PromotionId>,
) -> ApiResult<web::Json<Promotion>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(
        state.promotions.get(&member, path.into_inner()).await?,
    ))
}

/// Partial update. Absent fields are left unchanged.
#[utoipa::path(
    put,
    path = "/api/promotions/{id}",
    params(("id" = u64, Path, description = "Promotion id")),
    request_body = UpdatePromotionRequest,
    responses(
        (status = 200, description = "Promotion updated", body = Promotion),
        (status = 400, description = "Invalid change", body = Error),
        (status = 403, description = "Caller may not manage promotions", body = Error),
        (status = 404, description = "Unknown promotion", body = Error)
    ),
    tags = ["promotions"],
    operation_id = "updatePromotion"
)]
#[put("/{id}")]
pub async fn update(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<PromotionId>,
    payload: web::Json<UpdatePromotionRequest>,
) -> ApiResult<web::Json<Promotion>> {
    let member = session.current_member(&state.auth).await?;
    let promotion = state
        .promotions
        .update(&member, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(promotion))
}

/// Cancel a promotion. The record is kept.
#[utoipa::path(
    delete,
    path = "/api/promotions/{id}",
    params(("id" = u64, Path, description = "Promotion id")),
    responses(
        (status = 200, description = "Promotion cancelled", body = Promotion),
        (status = 403, description = "Caller may not manage promotions", body = Error),
        (status = 404, description = "Unknown promotion", body = Error)
    ),
    tags = ["promotions"],
    operation_id = "cancelPromotion"
)]
#[delete("/{id}")]
pub async fn cancel(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<PromotionId>,
) -> ApiResult<web::Json<Promotion>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(
        state.promotions.cancel(&member, path.into_inner()).await?,
    ))
}

/// Register the promotion routes on a `/promotions` scope.
///
/// Literal segments are registered before `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/promotions")
            .service(summary)
            .service(active)
            .service(list)
            .service(suggestions)
            .service(create)
            .service(get_promotion)
            .service(update)
            .service(cancel),
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

    fn campaign(store_id: StoreId) -> Value {
        json!({
            "name": "Spring dairy week",
            "discount_type": "percentage",
            "discount_value": 15.0,
            "start_date": "2026-03-01",
            "end_date": "2026-03-10",
            "store_ids": [store_id],
            "category": "Dairy",
        })
    }

    #[actix_web::test]
    async fn promotion_lifecycle() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::SuperAdmin).await;
        let store_id = fixture.demo.stores[0].id;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/promotions/create")
                .cookie(cookie.clone())
                .set_json(campaign(store_id))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: Promotion = test::read_body_json(res).await;
        assert_eq!(created.status, PromotionStatus::Active);

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/promotions/{}", created.id))
                .cookie(cookie.clone())
                .set_json(json!({ "discount_value": 20.0 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let updated: Promotion = test::read_body_json(res).await;
        assert_eq!(updated.discount_value, 20.0);
        assert_eq!(updated.name, created.name);

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/promotions/active?store_id={store_id}"))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        let running: ActivePromotions = test::read_body_json(res).await;
        assert!(running.promotions.iter().any(|p| p.id == created.id));

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/promotions/{}", created.id))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let cancelled: Promotion = test::read_body_json(res).await;
        assert_eq!(cancelled.status, PromotionStatus::Cancelled);
    }

    #[rstest]
    #[case(json!({"discount_value": 120.0}))]
    #[case(json!({"end_date": "2026-02-01"}))]
    #[case(json!({"name": "   "}))]
    #[case(json!({"store_ids": []}))]
    #[actix_web::test]
    async fn invalid_promotions_are_rejected(#[case] patch: Value) {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::SuperAdmin).await;
        let mut body = campaign(fixture.demo.stores[0].id);
        if let (Some(target), Some(changes)) = (body.as_object_mut(), patch.as_object()) {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/promotions/create")
                .cookie(cookie)
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn analysts_cannot_create_promotions() {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::Analyst).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/promotions/create")
                .cookie(cookie)
                .set_json(campaign(fixture.demo.stores[0].id))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[case("/api/promotions/summary")]
    #[case("/api/promotions/list?status=active")]
    #[case("/api/promotions/suggestions")]
    #[actix_web::test]
    async fn literal_routes_are_not_taken_for_ids(#[case] uri: &str) {
        let fixture = TestState::new();
        let app = test::init_service(test_app(&fixture)).await;
        let cookie = login_as(&app, &fixture, Role::SuperAdmin).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(uri).cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK, "{uri}");
    }
}
