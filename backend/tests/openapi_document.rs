//! The published OpenAPI document covers every dashboard surface.

use retail_backend::ApiDoc;
use retail_backend::test_support::openapi::{get_property, unwrap_object_schema};
use rstest::{fixture, rstest};
use utoipa::OpenApi;
use utoipa::openapi::OpenApi as Document;

#[fixture]
fn document() -> Document {
    ApiDoc::openapi()
}

fn operation_tags(doc: &Document) -> Vec<String> {
    doc.paths
        .paths
        .values()
        .flat_map(|item| {
            [&item.get, &item.post, &item.put, &item.delete]
                .into_iter()
                .flatten()
                .flat_map(|op| op.tags.clone().unwrap_or_default())
        })
        .collect()
}

#[rstest]
#[case("auth")]
#[case("admin")]
#[case("logistics")]
#[case("notifications")]
#[case("inventory")]
#[case("promotions")]
#[case("alerts")]
#[case("sales")]
#[case("analytics")]
#[case("history")]
#[case("reports")]
#[case("stream")]
#[case("health")]
fn every_tag_has_operations(document: Document, #[case] tag: &str) {
    assert!(
        operation_tags(&document).iter().any(|seen| seen == tag),
        "no operation tagged {tag}"
    );
}

#[rstest]
fn procurement_orders_document_their_workflow_fields(document: Document) {
    let schemas = &document.components.as_ref().expect("components").schemas;
    let order = unwrap_object_schema(
        schemas.get("ProcurementOrder").expect("ProcurementOrder schema"),
        "ProcurementOrder",
    );
    get_property(order, "status");
    get_property(order, "approval_chain");
    get_property(order, "priority");
}

#[rstest]
fn stream_routes_sit_outside_the_api_prefix(document: Document) {
    let routes: Vec<_> = document.paths.paths.keys().cloned().collect();
    assert!(routes.iter().any(|route| route == "/stream/sales"));
    assert!(!routes.iter().any(|route| route.starts_with("/api/stream")));
}

#[rstest]
fn list_pages_are_keyed_by_resource(document: Document) {
    let schemas = &document.components.as_ref().expect("components").schemas;
    for (schema, key) in [
        ("OrderPage", "orders"),
        ("AlertPage", "alerts"),
        ("PromotionPage", "promotions"),
    ] {
        let page = unwrap_object_schema(
            schemas.get(schema).unwrap_or_else(|| panic!("{schema} schema")),
            schema,
        );
        get_property(page, key);
        get_property(page, "total");
    }
}
