//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST and stream endpoint of the inbound layer
//! plus the session cookie security scheme. Schemas are collected from the
//! domain types the handlers reference. The document backs Swagger UI in
//! debug builds and is exported by `cargo run --bin openapi-dump`.

use crate::domain::{Error, ErrorCode};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST and stream API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Retail operations API",
        description = "Sales analytics, inventory, promotions, alerts and procurement approvals for a supermarket chain.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::me,
        crate::inbound::http::auth::accessible_stores,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::get_user,
        crate::inbound::http::admin::list_stores,
        crate::inbound::http::admin::get_store,
        crate::inbound::http::procurement::dashboard,
        crate::inbound::http::procurement::list_orders,
        crate::inbound::http::procurement::create_order,
        crate::inbound::http::procurement::create_orders_bulk,
        crate::inbound::http::procurement::get_order,
        crate::inbound::http::procurement::logistics_review,
        crate::inbound::http::procurement::vp_approval,
        crate::inbound::http::procurement::ship_order,
        crate::inbound::http::procurement::deliver_order,
        crate::inbound::http::procurement::cancel_order,
        crate::inbound::http::procurement::team,
        crate::inbound::http::procurement::approval_chain,
        crate::inbound::http::procurement::changes,
        crate::inbound::http::procurement::notifications,
        crate::inbound::http::procurement::mark_notification_read,
        crate::inbound::http::procurement::mark_all_notifications_read,
        crate::inbound::http::inventory::summary,
        crate::inbound::http::inventory::items,
        crate::inbound::http::inventory::low_stock,
        crate::inbound::http::inventory::categories,
        crate::inbound::http::inventory::store,
        crate::inbound::http::inventory::transfers,
        crate::inbound::http::inventory::create_transfer,
        crate::inbound::http::inventory::analytics,
        crate::inbound::http::promotions::summary,
        crate::inbound::http::promotions::active,
        crate::inbound::http::promotions::list,
        crate::inbound::http::promotions::suggestions,
        crate::inbound::http::promotions::create,
        crate::inbound::http::promotions::get_promotion,
        crate::inbound::http::promotions::update,
        crate::inbound::http::promotions::cancel,
        crate::inbound::http::alerts::summary,
        crate::inbound::http::alerts::list,
        crate::inbound::http::alerts::recent,
        crate::inbound::http::alerts::scan,
        crate::inbound::http::alerts::acknowledge,
        crate::inbound::http::alerts::resolve,
        crate::inbound::http::alerts::rules,
        crate::inbound::http::alerts::create_rule,
        crate::inbound::http::alerts::update_rule,
        crate::inbound::http::alerts::delete_rule,
        crate::inbound::http::sales::latest,
        crate::inbound::http::sales::metrics,
        crate::inbound::http::sales::trend,
        crate::inbound::http::sales::predictions,
        crate::inbound::http::analytics::kpis,
        crate::inbound::http::analytics::trend,
        crate::inbound::http::analytics::stores,
        crate::inbound::http::analytics::top_items,
        crate::inbound::http::analytics::categories,
        crate::inbound::http::analytics::streaming_trend,
        crate::inbound::http::analytics::summary,
        crate::inbound::http::history::list,
        crate::inbound::http::history::range,
        crate::inbound::http::history::stores,
        crate::inbound::http::history::items,
        crate::inbound::http::reports::sales,
        crate::inbound::http::reports::inventory,
        crate::inbound::http::reports::performance,
        crate::inbound::sse::sales_stream,
        crate::inbound::sse::alerts_stream,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "auth", description = "Sign-in, sign-out and the caller's profile"),
        (name = "admin", description = "Staff directory and store overviews"),
        (name = "logistics", description = "Procurement orders and their approval chain"),
        (name = "notifications", description = "Workflow notifications for the caller"),
        (name = "inventory", description = "Stock levels, low-stock reports and transfers"),
        (name = "promotions", description = "Promotion lifecycle and suggestions"),
        (name = "alerts", description = "Operational alerts and alert rules"),
        (name = "sales", description = "Live sales and sales analytics"),
        (name = "analytics", description = "Dashboard KPIs and executive charts"),
        (name = "history", description = "Raw daily sales history"),
        (name = "reports", description = "Period sales, inventory and store reports"),
        (name = "stream", description = "Server-sent event streams"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the published document.

    use super::*;
    use crate::test_support::openapi::{get_property, unwrap_object_schema};
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::PathItem;

    fn path<'a>(doc: &'a utoipa::openapi::OpenApi, route: &str) -> &'a PathItem {
        doc.paths
            .paths
            .get(route)
            .unwrap_or_else(|| panic!("path {route} missing"))
    }

    #[rstest]
    fn error_schema_exposes_code_and_message() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error = unwrap_object_schema(schemas.get("Error").expect("Error schema"), "Error");
        get_property(error, "code");
        get_property(error, "message");
        get_property(error, "traceId");
    }

    #[rstest]
    #[case("/api/auth/login")]
    #[case("/api/logistics/orders/{id}/logistics-review")]
    #[case("/api/logistics/orders/{id}/vp-approval")]
    #[case("/api/inventory/low-stock")]
    #[case("/api/promotions/{id}")]
    #[case("/api/alerts/rules")]
    #[case("/api/sales/trend")]
    #[case("/api/sales/predictions")]
    #[case("/api/kpis")]
    #[case("/api/analytics/summary")]
    #[case("/api/history")]
    #[case("/api/reports/performance")]
    #[case("/api/inventory/analytics")]
    #[case("/stream/sales")]
    #[case("/stream/alerts")]
    #[case("/health/ready")]
    fn documents_route(#[case] route: &str) {
        path(&ApiDoc::openapi(), route);
    }

    #[rstest]
    fn promotion_item_supports_read_update_and_cancel() {
        let doc = ApiDoc::openapi();
        let item = path(&doc, "/api/promotions/{id}");
        assert!(item.get.is_some());
        assert!(item.put.is_some());
        assert!(item.delete.is_some());
    }

    #[rstest]
    fn session_cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }

    #[rstest]
    fn operation_ids_are_unique() {
        let doc = ApiDoc::openapi();
        let mut ids: Vec<_> = doc
            .paths
            .paths
            .values()
            .flat_map(|item| {
                [
                    &item.get,
                    &item.post,
                    &item.put,
                    &item.delete,
                ]
                .into_iter()
                .flatten()
                .filter_map(|op| op.operation_id.clone())
            })
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
