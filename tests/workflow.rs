//! End-to-end runs against a real Postgres. Set `TEST_DATABASE_URL` and run
//! with `cargo test -- --ignored`.

mod common;

use axum::{
    Router,
    http::{Method, StatusCode},
};
use common::{send, test_config};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use maize_mill::{app, app_state::AppState, auth, db, schema::sessions};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static MIGRATED: OnceCell<()> = OnceCell::const_new();

async fn live_pool() -> db::DbPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    MIGRATED
        .get_or_init(|| async {
            db::run_migrations_blocking(MIGRATIONS, &url).await.unwrap();
        })
        .await;
    db::create_pool(&test_config(&url).database).await.unwrap()
}

async fn live_app() -> Router {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    app(AppState::new(live_pool().await, test_config(&url)))
}

async fn get(app: &Router, token: &str, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(token), None).await
}

async fn post(app: &Router, token: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

async fn patch(app: &Router, token: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

async fn sign_up(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "email": format!("miller-{}@mill.test", Uuid::new_v4()),
            "password": "maize-secret",
            "firstName": "Test",
            "lastName": "Miller",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn create_supplier(app: &Router, token: &str, name: &str) -> Value {
    let (status, supplier) = post(app, token, "/api/suppliers", json!({ "name": name })).await;
    assert_eq!(status, StatusCode::CREATED, "{}", supplier);
    supplier
}

async fn create_delivery(app: &Router, token: &str, supplier_id: &Value) -> Value {
    let (status, delivery) = post(
        app,
        token,
        "/api/deliveries",
        json!({
            "truckRegistration": "kca 123a",
            "driverName": "Samuel Mwangi",
            "supplierId": supplier_id,
            "expectedQuantity": "2500",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", delivery);
    delivery
}

async fn create_order(app: &Router, token: &str, product_type: &str, target: i32) -> Value {
    let (status, order) = post(
        app,
        token,
        "/api/production-orders",
        json!({ "productType": product_type, "targetQuantity": target }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    order
}

async fn weigh(app: &Router, token: &str, delivery_id: &Value) -> Value {
    let (status, reading) = post(
        app,
        token,
        "/api/weighbridge-readings",
        json!({
            "deliveryId": delivery_id,
            "grossWeight": 27500,
            "tareWeight": "25000",
            "operatorName": "Robert Ochieng",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", reading);
    reading
}

#[tokio::test]
#[ignore]
async fn weighing_a_delivery_approves_it_with_the_net_weight() {
    let app = live_app().await;
    let token = sign_up(&app).await;

    let supplier = create_supplier(&app, &token, "Green Valley Farms Test").await;
    let delivery = create_delivery(&app, &token, &supplier["id"]).await;
    assert_eq!(delivery["status"], "pending");
    assert_eq!(delivery["truckRegistration"], "KCA 123A");
    let delivery_id = delivery["id"].as_str().unwrap();

    let (_, pending) = get(&app, &token, "/api/deliveries/pending-weighbridge").await;
    assert!(pending.as_array().unwrap().iter().any(|d| d["id"] == delivery["id"]));

    let reading = weigh(&app, &token, &delivery["id"]).await;
    assert_eq!(reading["netWeight"], 2500.0);

    let (_, delivery) = get(&app, &token, &format!("/api/deliveries/{}", delivery_id)).await;
    assert_eq!(delivery["status"], "approved");
    assert_eq!(delivery["actualQuantity"], 2500.0);

    let reading_uri = format!("/api/weighbridge-readings/{}", reading["id"].as_str().unwrap());
    let (status, joined) = get(&app, &token, &reading_uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["delivery"]["id"], delivery["id"]);
    assert_eq!(joined["grossWeight"], 27500.0);
}

#[tokio::test]
#[ignore]
async fn weighing_overrides_rejected_and_stored_deliveries() {
    let app = live_app().await;
    let token = sign_up(&app).await;
    let supplier = create_supplier(&app, &token, "Override Test").await;

    for path in [
        &["quality_check", "rejected"][..],
        &["quality_check", "approved", "in_storage"][..],
    ] {
        let delivery = create_delivery(&app, &token, &supplier["id"]).await;
        let uri = format!("/api/deliveries/{}", delivery["id"].as_str().unwrap());

        for next in path {
            let status_uri = format!("{}/status", uri);
            let (status, body) = patch(&app, &token, &status_uri, json!({ "status": next })).await;
            assert_eq!(status, StatusCode::OK, "{}", body);
        }

        weigh(&app, &token, &delivery["id"]).await;

        let (_, weighed) = get(&app, &token, &uri).await;
        assert_eq!(weighed["status"], "approved", "after {:?}", path);
        assert_eq!(weighed["actualQuantity"], 2500.0);
    }
}

#[tokio::test]
#[ignore]
async fn tare_above_gross_is_rejected_and_nothing_changes() {
    let app = live_app().await;
    let token = sign_up(&app).await;
    let supplier = create_supplier(&app, &token, "Highlands Test").await;
    let delivery = create_delivery(&app, &token, &supplier["id"]).await;

    let (status, body) = post(
        &app,
        &token,
        "/api/weighbridge-readings",
        json!({
            "deliveryId": delivery["id"],
            "grossWeight": 20000,
            "tareWeight": 25000,
            "operatorName": "Robert Ochieng",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let uri = format!("/api/deliveries/{}", delivery["id"].as_str().unwrap());
    let (_, unchanged) = get(&app, &token, &uri).await;
    assert_eq!(unchanged["status"], "pending");
}

#[tokio::test]
#[ignore]
async fn rejected_delivery_cannot_be_approved() {
    let app = live_app().await;
    let token = sign_up(&app).await;
    let supplier = create_supplier(&app, &token, "Maize Masters Test").await;
    let delivery = create_delivery(&app, &token, &supplier["id"]).await;
    let uri = format!("/api/deliveries/{}/status", delivery["id"].as_str().unwrap());

    for next in ["quality_check", "rejected"] {
        let (status, body) = patch(&app, &token, &uri, json!({ "status": next })).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["status"], next);
    }

    let (status, body) = patch(&app, &token, &uri, json!({ "status": "approved" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("rejected"));
}

#[tokio::test]
#[ignore]
async fn delivery_for_unknown_supplier_is_a_bad_request() {
    let app = live_app().await;
    let token = sign_up(&app).await;

    let (status, body) = post(
        &app,
        &token,
        "/api/deliveries",
        json!({
            "truckRegistration": "KDA 404X",
            "driverName": "Nobody",
            "supplierId": Uuid::new_v4(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert!(body["message"].as_str().unwrap().contains("foreign key"));
}

#[tokio::test]
#[ignore]
async fn duplicate_order_number_is_a_bad_request() {
    let app = live_app().await;
    let token = sign_up(&app).await;
    let number = format!("PO-TEST-{}", Uuid::new_v4().simple());
    let body = json!({
        "orderNumber": number,
        "productType": "maize_flour_2kg",
        "targetQuantity": 100,
    });

    let (status, first) = post(&app, &token, "/api/production-orders", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", first);
    assert_eq!(first["orderNumber"], number.as_str());

    let (status, second) = post(&app, &token, "/api/production-orders", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", second);
    assert!(second["message"].as_str().unwrap().contains("duplicate"));
}

#[tokio::test]
#[ignore]
async fn production_progress_is_capped_and_monotonic() {
    let app = live_app().await;
    let token = sign_up(&app).await;

    let order = create_order(&app, &token, "maize_flour_2kg", 1000).await;
    assert_eq!(order["status"], "scheduled");
    assert!(order["orderNumber"].as_str().unwrap().starts_with("PO-"));
    let id = order["id"].as_str().unwrap();

    let status_uri = format!("/api/production-orders/{}/status", id);
    let (_, started) = patch(&app, &token, &status_uri, json!({ "status": "in_progress" })).await;
    assert_eq!(started["status"], "in_progress");
    assert!(started["startedAt"].is_string());

    let progress_uri = format!("/api/production-orders/{}/progress", id);
    let (status, order) =
        patch(&app, &token, &progress_uri, json!({ "completedQuantity": 850 })).await;
    assert_eq!(status, StatusCode::OK, "{}", order);
    assert_eq!(order["progressPercent"], 85.0);
    assert_eq!(order["status"], "in_progress");

    for rejected in [1200, 800, -1] {
        let body = json!({ "completedQuantity": rejected });
        let (status, _) = patch(&app, &token, &progress_uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "completedQuantity {}", rejected);
    }

    let (_, order) = get(&app, &token, &format!("/api/production-orders/{}", id)).await;
    assert_eq!(order["completedQuantity"], 850);
}

#[tokio::test]
#[ignore]
async fn materials_for_unknown_order_are_not_found() {
    let app = live_app().await;
    let token = sign_up(&app).await;
    let uri = format!("/api/production-orders/{}/materials", Uuid::new_v4());

    let (status, _) = get(&app, &token, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = json!({ "batchId": Uuid::new_v4(), "quantityUsed": 100 });
    let (status, body) = post(&app, &token, &uri, body).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
}

#[tokio::test]
#[ignore]
async fn batches_and_checks_can_be_fetched_by_id() {
    let app = live_app().await;
    let token = sign_up(&app).await;
    let supplier = create_supplier(&app, &token, "Lookup Test").await;
    let delivery = create_delivery(&app, &token, &supplier["id"]).await;
    let order = create_order(&app, &token, "maize_flour_4kg", 200).await;

    let (status, raw) = post(
        &app,
        &token,
        "/api/raw-material-batches",
        json!({ "deliveryId": delivery["id"], "quantity": "2500", "moistureLevel": 12.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", raw);

    let (status, finished) = post(
        &app,
        &token,
        "/api/finished-product-batches",
        json!({
            "productionOrderId": order["id"],
            "productType": "maize_flour_4kg",
            "quantity": 200,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", finished);

    let (status, check) = post(
        &app,
        &token,
        "/api/quality-checks",
        json!({ "batchId": raw["id"], "checkType": "raw_material", "moistureLevel": 12.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", check);

    for (collection, created) in [
        ("raw-material-batches", &raw),
        ("finished-product-batches", &finished),
        ("quality-checks", &check),
    ] {
        let uri = format!("/api/{}/{}", collection, created["id"].as_str().unwrap());
        let (status, fetched) = get(&app, &token, &uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(&fetched, created);

        let missing = format!("/api/{}/{}", collection, Uuid::new_v4());
        let (status, _) = get(&app, &token, &missing).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", collection);
    }
}

#[tokio::test]
#[ignore]
async fn dispatch_moves_through_transit_to_delivery() {
    let app = live_app().await;
    let token = sign_up(&app).await;

    let order = create_order(&app, &token, "maize_flour_4kg", 500).await;
    let (status, batch) = post(
        &app,
        &token,
        "/api/finished-product-batches",
        json!({
            "productionOrderId": order["id"],
            "productType": "maize_flour_4kg",
            "quantity": 500,
            "packageSize": "4kg",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", batch);

    let (status, dispatch) = post(
        &app,
        &token,
        "/api/dispatch-orders",
        json!({
            "customerName": "Naivas Supermarket",
            "items": [{ "finishedBatchId": batch["id"], "quantity": 40 }],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", dispatch);
    assert_eq!(dispatch["items"].as_array().unwrap().len(), 1);
    let uri = format!("/api/dispatch-orders/{}/status", dispatch["id"].as_str().unwrap());

    let (status, _) = patch(&app, &token, &uri, json!({ "status": "delivered" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, dispatched) = patch(&app, &token, &uri, json!({ "status": "dispatched" })).await;
    assert!(dispatched["dispatchedAt"].is_string());
    let (_, transit) = patch(&app, &token, &uri, json!({ "status": "in_transit" })).await;
    assert_eq!(transit["status"], "in_transit");
    let (_, delivered) = patch(&app, &token, &uri, json!({ "status": "delivered" })).await;
    assert!(delivered["deliveredAt"].is_string());
    assert_eq!(delivered["dispatchedAt"], dispatched["dispatchedAt"]);
}

#[tokio::test]
#[ignore]
async fn suppliers_are_listed_newest_first() {
    let app = live_app().await;
    let token = sign_up(&app).await;

    let first = create_supplier(&app, &token, "Older Supplier").await;
    let second = create_supplier(&app, &token, "Newer Supplier").await;

    let (_, list) = get(&app, &token, "/api/suppliers").await;
    let ids: Vec<&Value> = list.as_array().unwrap().iter().map(|s| &s["id"]).collect();
    let first_at = ids.iter().position(|id| **id == first["id"]).unwrap();
    let second_at = ids.iter().position(|id| **id == second["id"]).unwrap();
    assert!(second_at < first_at);
}

#[tokio::test]
#[ignore]
async fn demo_data_loads_once_whatever_the_supplier_names() {
    let app = live_app().await;
    let token = sign_up(&app).await;

    create_supplier(&app, &token, "Green Valley Farms").await;

    let (status, body) = send(&app, Method::POST, "/api/seed-demo-data", Some(&token), None).await;
    match status {
        StatusCode::CREATED => assert_eq!(body["productionOrders"], 3),
        _ => assert_eq!(body["message"], "Demo data is already loaded"),
    }

    let (status, body) = send(&app, Method::POST, "/api/seed-demo-data", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Demo data is already loaded");

    let (_, orders) = get(&app, &token, "/api/production-orders").await;
    let orders = orders.as_array().unwrap();
    assert!(orders.iter().any(|o| o["orderNumber"] == "PO-2025-001"));
}

#[tokio::test]
#[ignore]
async fn dashboard_metrics_stay_in_range() {
    let app = live_app().await;
    let token = sign_up(&app).await;

    let (status, metrics) = get(&app, &token, "/api/dashboard/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let score = metrics["qualityScore"].as_f64().unwrap();
    let level = metrics["inventoryLevel"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert!((0.0..=100.0).contains(&level));
    assert!(metrics["dailyProduction"].as_i64().unwrap() >= 0);
    assert!(metrics["inventoryQuantity"].as_f64().is_some());
}

#[tokio::test]
#[ignore]
async fn logout_ends_the_session() {
    let app = live_app().await;
    let token = sign_up(&app).await;

    let (status, user) = get(&app, &token, "/api/auth/user").await;
    assert_eq!(status, StatusCode::OK);
    assert!(user.get("passwordHash").is_none());

    let (status, _) = send(&app, Method::POST, "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &token, "/api/auth/user").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn opening_a_session_sweeps_expired_ones() {
    let app = live_app().await;
    let token = sign_up(&app).await;
    let (_, user) = get(&app, &token, "/api/auth/user").await;
    let user_id: Uuid = user["id"].as_str().unwrap().parse().unwrap();

    let pool = live_pool().await;
    let mut pooled = pool.get().await.unwrap();
    let conn: &mut AsyncPgConnection = &mut pooled;

    let expired = auth::create_session(conn, user_id, -1).await.unwrap();
    assert!(auth::resolve_session(conn, &expired).await.unwrap().is_none());

    auth::create_session(conn, user_id, 1).await.unwrap();

    let left: i64 = sessions::table
        .filter(sessions::token_hash.eq(auth::hash_token(&expired)))
        .count()
        .get_result(conn)
        .await
        .unwrap();
    assert_eq!(left, 0);

    let (status, _) = get(&app, &token, "/api/auth/user").await;
    assert_eq!(status, StatusCode::OK);
}
