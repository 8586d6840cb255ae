//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod alerts;
pub mod analytics;
pub mod auth;
pub mod error;
pub mod health;
pub mod history;
pub mod inventory;
pub mod pages;
pub mod procurement;
pub mod promotions;
pub mod reports;
pub mod sales;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api` route. Callers wrap this in the `/api` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::logout)
        .service(auth::me)
        .service(auth::accessible_stores)
        .service(admin::list_users)
        .service(admin::get_user)
        .service(admin::list_stores)
        .service(admin::get_store)
        .configure(procurement::configure)
        .configure(inventory::configure)
        .configure(promotions::configure)
        .configure(alerts::configure)
        .configure(sales::configure)
        .configure(analytics::configure)
        .configure(history::configure)
        .configure(reports::configure);
}
