use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use delivery_dispatch::api::rest::router;
use delivery_dispatch::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(1024));
    (router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn patch_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn register_partner(app: &axum::Router, name: &str) -> String {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/partners",
            json!({
                "name": name,
                "phone": "+91-9811122233",
                "vehicle_type": "Bike",
                "vehicle_number": "KA-01-AB-1234",
                "rating": 4.7
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let partner = body_json(res).await;
    partner["id"].as_str().unwrap().to_string()
}

async fn place_order(app: &axum::Router) -> String {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders",
            json!({
                "items": [{ "name": "Paneer Tikka", "quantity": 2 }],
                "amount": 24.5
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let order = body_json(res).await;
    order["id"].as_str().unwrap().to_string()
}

async fn assign(app: &axum::Router, order_id: &str, partner_id: &str) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/assignments",
            json!({ "order_id": order_id, "partner_id": partner_id }),
        ))
        .await
        .unwrap()
}

async fn advance(app: &axum::Router, order_id: &str, status: &str) -> axum::response::Response {
    app.clone()
        .oneshot(patch_request(
            &format!("/orders/{order_id}/status"),
            json!({ "status": status }),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["orders"], 0);
    assert_eq!(body["partners"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("deliveries_completed_total"));
}

#[tokio::test]
async fn register_partner_returns_available_partner() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/partners",
            json!({
                "name": "Asha",
                "phone": "+91-9900112233",
                "vehicle_type": "Scooter",
                "vehicle_number": "KA-05-HF-8821"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "Asha");
    assert_eq!(body["is_available"], true);
    assert_eq!(body["total_deliveries"], 0);
    assert_eq!(body["rating"], 5.0);
    assert!(body["current_location"].is_null());
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn register_partner_blank_name_returns_400() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/partners",
            json!({
                "name": "  ",
                "phone": "+91-9900112233",
                "vehicle_type": "Bike",
                "vehicle_number": "KA-05-HF-8821"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_partner_rating_clamped_to_5() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/partners",
            json!({
                "name": "Max",
                "phone": "+91-9900112233",
                "vehicle_type": "Car",
                "vehicle_number": "KA-05-HF-8821",
                "rating": 9.9
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["rating"], 5.0);
}

#[tokio::test]
async fn create_order_starts_unassigned() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/orders",
            json!({
                "items": [{ "name": "Masala Dosa", "quantity": 1 }],
                "amount": 8.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["delivery_status"], "NotAssigned");
    assert_eq!(body["fulfillment_status"], "Processing");
    assert!(body["assigned_partner"].is_null());
    assert!(body["tracking_id"].is_null());
}

#[tokio::test]
async fn create_order_with_no_items_returns_400() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/orders",
            json!({ "items": [], "amount": 8.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_nonexistent_order_returns_404() {
    let (app, _state) = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/orders/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn assignment_claims_partner_and_binds_order() {
    let (app, _state) = setup();
    let partner_id = register_partner(&app, "Kiran").await;
    let order_id = place_order(&app).await;

    let res = assign(&app, &order_id, &partner_id).await;
    assert_eq!(res.status(), StatusCode::OK);

    let receipt = body_json(res).await;
    let tracking_id = receipt["tracking_id"].as_str().unwrap();
    assert!(tracking_id.starts_with("TRK"));
    assert!(!receipt["estimated_delivery_time"].as_str().unwrap().is_empty());

    let res = app
        .clone()
        .oneshot(get_request(&format!("/orders/{order_id}")))
        .await
        .unwrap();
    let order = body_json(res).await;
    assert_eq!(order["delivery_status"], "Assigned");
    assert_eq!(order["assigned_partner"], partner_id.as_str());
    assert_eq!(order["tracking_id"], tracking_id);

    let res = app
        .oneshot(get_request(&format!("/partners/{partner_id}")))
        .await
        .unwrap();
    let partner = body_json(res).await;
    assert_eq!(partner["is_available"], false);
}

#[tokio::test]
async fn assigning_an_assigned_order_returns_conflict() {
    let (app, _state) = setup();
    let first = register_partner(&app, "Kiran").await;
    let second = register_partner(&app, "Meena").await;
    let order_id = place_order(&app).await;

    let res = assign(&app, &order_id, &first).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = assign(&app, &order_id, &second).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The losing call must not claim the second partner.
    let res = app
        .oneshot(get_request(&format!("/partners/{second}")))
        .await
        .unwrap();
    let partner = body_json(res).await;
    assert_eq!(partner["is_available"], true);
}

#[tokio::test]
async fn assigning_a_busy_partner_returns_conflict() {
    let (app, _state) = setup();
    let partner_id = register_partner(&app, "Kiran").await;
    let first_order = place_order(&app).await;
    let second_order = place_order(&app).await;

    let res = assign(&app, &first_order, &partner_id).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = assign(&app, &second_order, &partner_id).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn assigning_unknown_partner_returns_404() {
    let (app, _state) = setup();
    let order_id = place_order(&app).await;

    let res = assign(&app, &order_id, "00000000-0000-0000-0000-000000000000").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn skipping_a_delivery_step_returns_conflict() {
    let (app, _state) = setup();
    let partner_id = register_partner(&app, "Kiran").await;
    let order_id = place_order(&app).await;
    assign(&app, &order_id, &partner_id).await;

    let res = advance(&app, &order_id, "Delivered").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_status_value_returns_400() {
    let (app, _state) = setup();
    let partner_id = register_partner(&app, "Kiran").await;
    let order_id = place_order(&app).await;
    assign(&app, &order_id, &partner_id).await;

    let res = advance(&app, &order_id, "Teleported").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_delivery_lifecycle_releases_and_credits_partner() {
    let (app, _state) = setup();
    let partner_id = register_partner(&app, "Kiran").await;
    let order_id = place_order(&app).await;
    assign(&app, &order_id, &partner_id).await;

    for status in ["PickedUp", "OutForDelivery", "Delivered"] {
        let res = advance(&app, &order_id, status).await;
        assert_eq!(res.status(), StatusCode::OK, "advance to {status}");
    }

    let res = app
        .clone()
        .oneshot(get_request(&format!("/orders/{order_id}")))
        .await
        .unwrap();
    let order = body_json(res).await;
    assert_eq!(order["delivery_status"], "Delivered");
    assert_eq!(order["fulfillment_status"], "Delivered");

    let res = app
        .clone()
        .oneshot(get_request(&format!("/partners/{partner_id}")))
        .await
        .unwrap();
    let partner = body_json(res).await;
    assert_eq!(partner["is_available"], true);
    assert_eq!(partner["total_deliveries"], 1);

    // Repeating the terminal call must not credit again.
    let res = advance(&app, &order_id, "Delivered").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .oneshot(get_request(&format!("/partners/{partner_id}")))
        .await
        .unwrap();
    let partner = body_json(res).await;
    assert_eq!(partner["total_deliveries"], 1);
}

#[tokio::test]
async fn tracking_reflects_last_reported_location() {
    let (app, _state) = setup();
    let partner_id = register_partner(&app, "Kiran").await;
    let order_id = place_order(&app).await;
    assign(&app, &order_id, &partner_id).await;

    let res = app
        .clone()
        .oneshot(patch_request(
            &format!("/partners/{partner_id}/location"),
            json!({ "lat": 12.9, "lng": 77.5 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(get_request(&format!("/orders/{order_id}/track")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let view = body_json(res).await;
    assert_eq!(view["delivery_status"], "Assigned");
    assert_eq!(view["partner"]["name"], "Kiran");
    assert_eq!(view["partner"]["current_location"]["lat"], 12.9);
    assert_eq!(view["partner"]["current_location"]["lng"], 77.5);
    assert_eq!(view["last_known_location"]["lat"], 12.9);
    assert!(view["tracking_id"].as_str().unwrap().starts_with("TRK"));
}

#[tokio::test]
async fn tracking_an_unassigned_order_has_no_partner() {
    let (app, _state) = setup();
    let order_id = place_order(&app).await;

    let res = app
        .oneshot(get_request(&format!("/orders/{order_id}/track")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let view = body_json(res).await;
    assert_eq!(view["delivery_status"], "NotAssigned");
    assert!(view["partner"].is_null());
    assert!(view["last_known_location"].is_null());
}

#[tokio::test]
async fn available_partners_excludes_claimed_partner() {
    let (app, _state) = setup();
    let first = register_partner(&app, "Kiran").await;
    let _second = register_partner(&app, "Meena").await;
    let order_id = place_order(&app).await;
    assign(&app, &order_id, &first).await;

    let res = app
        .oneshot(get_request("/partners/available"))
        .await
        .unwrap();
    let partners = body_json(res).await;
    let list = partners.as_array().unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Meena");
}

#[tokio::test]
async fn partner_active_orders_lists_in_flight_work() {
    let (app, _state) = setup();
    let partner_id = register_partner(&app, "Kiran").await;
    let order_id = place_order(&app).await;
    assign(&app, &order_id, &partner_id).await;

    let res = app
        .clone()
        .oneshot(get_request(&format!("/partners/{partner_id}/orders")))
        .await
        .unwrap();
    let orders = body_json(res).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["id"], order_id.as_str());

    for status in ["PickedUp", "OutForDelivery", "Delivered"] {
        advance(&app, &order_id, status).await;
    }

    let res = app
        .oneshot(get_request(&format!("/partners/{partner_id}/orders")))
        .await
        .unwrap();
    let orders = body_json(res).await;
    assert!(orders.as_array().unwrap().is_empty());
}
