//! Staff and store administration.
//!
//! ```text
//! GET /api/admin/users?search&role&page&limit   (super_admin only)
//! GET /api/admin/users/{id}                     (super_admin only)
//! GET /api/admin/stores
//! GET /api/admin/stores/{store_id}
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    Error, PageRequest, Role, StaffId, StaffProfile, StoreDetail, StoreId,
    StoreOverviewList, UserFilter,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::pages::UserPage;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const DEFAULT_USERS_LIMIT: u32 = 50;
const MAX_USERS_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsersQuery {
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    pub role: Option<Role>,
    #[param(minimum = 1)]
    pub page: Option<u32>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<u32>,
}

/// Staff directory, filtered and paged.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UsersQuery),
    responses(
        (status = 200, description = "Staff page", body = UserPage),
        (status = 400, description = "Invalid paging", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Super admin access required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "listStaff"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<UsersQuery>,
) -> ApiResult<web::Json<UserPage>> {
    let member = session.current_member(&state.auth).await?;
    let UsersQuery {
        search,
        role,
        page,
        limit,
    } = query.into_inner();
    let page = PageRequest::new(page, limit, DEFAULT_USERS_LIMIT, MAX_USERS_LIMIT)?;
    let filter = UserFilter { search, role };
    let users = state.admin.users(&member, &filter, page).await?;
    Ok(web::Json(users.into()))
}

/// One staff member.
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "Staff id (UUID)")),
    responses(
        (status = 200, description = "Staff profile", body = StaffProfile),
        (status = 403, description = "Super admin access required", body = Error),
        (status = 404, description = "Unknown staff member", body = Error)
    ),
    tags = ["admin"],
    operation_id = "getStaff"
)]
#[get("/admin/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<StaffProfile>> {
    let member = session.current_member(&state.auth).await?;
    let raw = path.into_inner();
    let id: StaffId = raw
        .parse()
        .map_err(|_| Error::not_found(format!("staff member {raw} not found")))?;
    Ok(web::Json(state.admin.user(&member, &id).await?))
}

/// Stores within scope with 30-day activity.
#[utoipa::path(
    get,
    path = "/api/admin/stores",
    responses(
        (status = 200, description = "Store overviews", body = StoreOverviewList),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["admin"],
    operation_id = "listStores"
)]
#[get("/admin/stores")]
pub async fn list_stores(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StoreOverviewList>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.admin.stores(&member).await?))
}

/// One store with weekly comparison and top categories.
#[utoipa::path(
    get,
    path = "/api/admin/stores/{store_id}",
    params(("store_id" = u32, Path, description = "Store id")),
    responses(
        (status = 200, description = "Store detail", body = StoreDetail),
        (status = 403, description = "Store outside scope", body = Error),
        (status = 404, description = "Unknown store", body = Error)
    ),
    tags = ["admin"],
    operation_id = "getStore"
)]
#[get("/admin/stores/{store_id}")]
pub async fn get_store(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<StoreId>,
) -> ApiResult<web::Json<StoreDetail>> {
    let member = session.current_member(&state.auth).await?;
    Ok(web::Json(state.admin.store(&member, path.into_inner()).await?))
}
