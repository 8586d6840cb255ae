//! Sign-in, sign-out and the caller's own profile.
//!
//! ```text
//! POST /api/auth/login {"email":"superadmin@retail.example","password":"retail-demo"}
//! POST /api/auth/logout
//! GET  /api/auth/me
//! GET  /api/auth/accessible-stores
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    AccessibleStores, Error, LoginCredentials, LoginValidationError, StaffProfile,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "superadmin@retail.example")]
    pub email: String,
    #[schema(example = "retail-demo")]
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyEmail => Error::invalid_request("email must not be empty")
            .with_details(json!({ "field": "email", "code": "empty_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = StaffProfile,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Blank email or password", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Staff directory unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<StaffProfile>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let member = state.auth.login(&credentials).await?;
    session.persist_staff(&member.id)?;
    Ok(web::Json(StaffProfile::from(&member)))
}

/// End the session. Succeeds whether or not one existed.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Signed out")),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// The signed-in member with permissions and store scope.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current staff profile", body = StaffProfile),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentStaff"
)]
#[get("/auth/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StaffProfile>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(StaffProfile::from(&member)))
}

/// Stores within the caller's scope.
#[utoipa::path(
    get,
    path = "/api/auth/accessible-stores",
    responses(
        (status = 200, description = "Visible stores", body = AccessibleStores),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["auth"],
    operation_id = "accessibleStores"
)]
#[get("/auth/accessible-stores")]
pub async fn accessible_stores(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AccessibleStores>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.auth.accessible_stores(&member).await?))
}
