mod common;

use axum::http::{Method, StatusCode};
use common::{offline_app, send};
use serde_json::json;

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = offline_app();

    for (method, uri) in [
        (Method::GET, "/api/dashboard/metrics"),
        (Method::GET, "/api/suppliers"),
        (Method::GET, "/api/deliveries/pending-weighbridge"),
        (Method::POST, "/api/weighbridge-readings"),
        (
            Method::PATCH,
            "/api/production-orders/6f1c1f2e-8a53-4c6e-9d3c-0b7f7f4f2a11/progress",
        ),
        (Method::GET, "/api/raw-material-batches/6f1c1f2e-8a53-4c6e-9d3c-0b7f7f4f2a11"),
        (Method::GET, "/api/warehouse/stock"),
        (Method::POST, "/api/seed-demo-data"),
        (Method::GET, "/api/auth/user"),
        (Method::POST, "/api/logout"),
    ] {
        let (status, body) = send(&app, method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["message"], "Unauthorized");
    }
}

#[tokio::test]
async fn malformed_login_body_is_a_bad_request() {
    let app = offline_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "miller@mill.co.ke" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn openapi_document_lists_the_mill_routes() {
    let app = offline_app();

    let (status, doc) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Maize Mill API");

    let paths = doc["paths"].as_object().unwrap();
    for path in [
        "/api/register",
        "/api/login",
        "/api/deliveries/{id}/status",
        "/api/weighbridge-readings",
        "/api/production-orders/{id}/progress",
        "/api/dispatch-orders/{id}",
        "/api/raw-material-batches/{id}",
        "/api/finished-product-batches/{id}",
        "/api/quality-checks/{id}",
        "/api/production-orders/{id}/materials",
        "/api/dashboard/metrics",
    ] {
        assert!(paths.contains_key(path), "missing {}", path);
    }
    assert!(doc["components"]["securitySchemes"]["session"].is_object());
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = offline_app();
    let (status, _) = send(&app, Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
