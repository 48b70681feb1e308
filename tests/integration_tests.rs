use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Local};
use tower::ServiceExt;

use bookings::config::AppConfig;
use bookings::db::{self, SqliteBookingStore};
use bookings::handlers;
use bookings::models::{Identity, Role};
use bookings::services::bookings::BookingService;
use bookings::services::identity::issue_token;
use bookings::state::AppState;

const SECRET: &str = "test-secret";

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 5001,
        database_url: ":memory:".to_string(),
        token_secret: SECRET.to_string(),
        cors_origins: vec!["http://localhost:8081".to_string()],
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        config: test_config(),
        bookings: BookingService::new(Arc::new(SqliteBookingStore::new(conn))),
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::app(state)
}

fn bearer(user_id: &str, role: Role) -> String {
    let token = issue_token(SECRET, &Identity::new(user_id, role)).unwrap();
    format!("Bearer {token}")
}

fn user(user_id: &str) -> String {
    bearer(user_id, Role::User)
}

fn admin() -> String {
    bearer("admin-1", Role::Admin)
}

fn tomorrow() -> String {
    (Local::now().date_naive() + Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}

fn booking_body(zip: &str) -> serde_json::Value {
    serde_json::json!({
        "service": "Cleaning",
        "date": tomorrow(),
        "timeSlot": "09:00 AM",
        "notes": "Please bring eco-friendly supplies",
        "address": {
            "street": "500 Howard St",
            "city": "San Francisco",
            "state": "CA",
            "zipCode": zip
        }
    })
}

fn request(method: &str, uri: &str, auth: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", auth);
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Creates a booking as `auth` and returns its id.
async fn create(state: &Arc<AppState>, auth: &str) -> String {
    let (status, json) = send(
        state,
        request("POST", "/api/bookings", auth, Some(booking_body("94107"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["booking"]["id"].as_str().unwrap().to_string()
}

async fn set_status(state: &Arc<AppState>, id: &str, status: &str) {
    let (code, _) = send(
        state,
        request(
            "PUT",
            &format!("/api/bookings/{id}"),
            &admin(),
            Some(serde_json::json!({ "status": status })),
        ),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
}

// ── Identity ──

#[tokio::test]
async fn test_requires_auth() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_token() {
    let state = test_state();
    let forged = issue_token("other-secret", &Identity::new("u", Role::Admin)).unwrap();
    let (status, json) = send(
        &state,
        request("GET", "/api/bookings", &format!("Bearer {forged}"), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");
    assert_eq!(json["message"], "unauthorized");
}

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

// ── Create ──

#[tokio::test]
async fn test_create_booking() {
    let state = test_state();
    let (status, json) = send(
        &state,
        request("POST", "/api/bookings", &user("u"), Some(booking_body("94107"))),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Booking created successfully");
    let booking = &json["booking"];
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["owner"], "u");
    assert_eq!(booking["service"], "Cleaning");
    assert_eq!(booking["date"], tomorrow());
    assert_eq!(booking["timeSlot"], "09:00 AM");
    assert_eq!(booking["address"]["zipCode"], "94107");
    assert!(booking["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_accepts_zip_plus_four() {
    let state = test_state();
    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/bookings",
            &user("u"),
            Some(booking_body("94107-1234")),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["booking"]["address"]["zipCode"], "94107-1234");
}

#[tokio::test]
async fn test_create_rejects_bad_zip() {
    let state = test_state();
    let (status, json) = send(
        &state,
        request("POST", "/api/bookings", &user("u"), Some(booking_body("ABCDE"))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation failed");
    assert_eq!(json["violations"][0]["field"], "address.zipCode");
}

#[tokio::test]
async fn test_create_rejects_missing_fields() {
    let state = test_state();
    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/bookings",
            &user("u"),
            Some(serde_json::json!({ "notes": "hi" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = json["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["service", "date", "timeSlot", "address"]);
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookings")
                .header("Authorization", user("u"))
                .header("Content-Type", "application/json")
                .body(Body::from("{\"service\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── List / Get ──

#[tokio::test]
async fn test_list_is_self_scoped() {
    let state = test_state();
    let mine = create(&state, &user("u")).await;
    create(&state, &user("v")).await;

    let (status, json) = send(&state, request("GET", "/api/bookings", &user("u"), None)).await;
    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], mine.as_str());

    let (_, json) = send(&state, request("GET", "/api/bookings", &admin(), None)).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_booking() {
    let state = test_state();
    let id = create(&state, &user("u")).await;

    let (status, json) = send(
        &state,
        request("GET", &format!("/api/bookings/{id}"), &user("u"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id.as_str());
}

#[tokio::test]
async fn test_get_other_users_booking_is_not_found() {
    let state = test_state();
    let id = create(&state, &user("u")).await;

    let (status, json) = send(
        &state,
        request("GET", &format!("/api/bookings/{id}"), &user("v"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Booking not found");
    assert_eq!(json["message"], "Booking not found");

    let (status, _) = send(
        &state,
        request("GET", "/api/bookings/does-not-exist", &user("u"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Update ──

#[tokio::test]
async fn test_update_merges_supplied_fields() {
    let state = test_state();
    let id = create(&state, &user("u")).await;

    let (status, json) = send(
        &state,
        request(
            "PUT",
            &format!("/api/bookings/{id}"),
            &user("u"),
            Some(serde_json::json!({ "timeSlot": "02:00 PM", "service": "Moving" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Booking updated successfully");
    let booking = &json["booking"];
    assert_eq!(booking["timeSlot"], "02:00 PM");
    assert_eq!(booking["service"], "Moving");
    assert_eq!(booking["notes"], "Please bring eco-friendly supplies");
    assert_eq!(booking["address"]["street"], "500 Howard St");
}

#[tokio::test]
async fn test_update_not_pending_rejected_for_owner() {
    let state = test_state();
    let id = create(&state, &user("u")).await;
    set_status(&state, &id, "confirmed").await;

    let (status, json) = send(
        &state,
        request(
            "PUT",
            &format!("/api/bookings/{id}"),
            &user("u"),
            Some(serde_json::json!({ "notes": "changed my mind" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Cannot modify booking that is not in pending status"
    );
    assert_eq!(json["message"], json["error"]);
}

#[tokio::test]
async fn test_update_to_past_date_rejected() {
    let state = test_state();
    let id = create(&state, &user("u")).await;
    let yesterday = (Local::now().date_naive() - Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();

    let (status, json) = send(
        &state,
        request(
            "PUT",
            &format!("/api/bookings/{id}"),
            &user("u"),
            Some(serde_json::json!({ "date": yesterday })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "validation failed");
    let violations = json["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["field"], "date");

    let (_, json) = send(
        &state,
        request("GET", &format!("/api/bookings/{id}"), &user("u"), None),
    )
    .await;
    assert_eq!(json["date"], tomorrow().as_str());
}

#[tokio::test]
async fn test_create_rejects_five_digit_year() {
    let state = test_state();
    let mut body = booking_body("94107");
    body["date"] = serde_json::json!("+10000-01-01");

    let (status, json) = send(
        &state,
        request("POST", "/api/bookings", &user("u"), Some(body)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["violations"][0]["field"], "date");
}

#[tokio::test]
async fn test_admin_confirms_users_booking() {
    let state = test_state();
    let id = create(&state, &user("u")).await;

    let (status, json) = send(
        &state,
        request(
            "PUT",
            &format!("/api/bookings/{id}"),
            &admin(),
            Some(serde_json::json!({ "status": "confirmed" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["status"], "confirmed");
    assert_eq!(json["booking"]["owner"], "u");
}

#[tokio::test]
async fn test_user_cannot_set_status() {
    let state = test_state();
    let id = create(&state, &user("u")).await;

    let (status, _) = send(
        &state,
        request(
            "PUT",
            &format!("/api/bookings/{id}"),
            &user("u"),
            Some(serde_json::json!({ "status": "completed" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = send(
        &state,
        request("GET", &format!("/api/bookings/{id}"), &user("u"), None),
    )
    .await;
    assert_eq!(json["status"], "pending");
}

#[tokio::test]
async fn test_update_by_stranger_is_not_found() {
    let state = test_state();
    let id = create(&state, &user("u")).await;

    let (status, _) = send(
        &state,
        request(
            "PUT",
            &format!("/api/bookings/{id}"),
            &user("v"),
            Some(serde_json::json!({ "notes": "mine now" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Cancel ──

#[tokio::test]
async fn test_cancel_twice() {
    let state = test_state();
    let id = create(&state, &user("u")).await;
    let uri = format!("/api/bookings/{id}/cancel");

    let (status, json) = send(&state, request("PATCH", &uri, &user("u"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Booking cancelled successfully");
    assert_eq!(json["booking"]["status"], "cancelled");

    let (status, json) = send(&state, request("PATCH", &uri, &user("u"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Cannot cancel booking that is completed or already cancelled"
    );
}

#[tokio::test]
async fn test_cancel_completed_rejected() {
    let state = test_state();
    let id = create(&state, &user("u")).await;
    set_status(&state, &id, "confirmed").await;
    set_status(&state, &id, "completed").await;

    let (status, _) = send(
        &state,
        request("PATCH", &format!("/api/bookings/{id}/cancel"), &user("u"), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_by_stranger_is_not_found() {
    let state = test_state();
    let id = create(&state, &user("u")).await;

    let (status, _) = send(
        &state,
        request("PATCH", &format!("/api/bookings/{id}/cancel"), &user("v"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Delete ──

#[tokio::test]
async fn test_delete_completed_booking() {
    let state = test_state();
    let id = create(&state, &user("u")).await;
    set_status(&state, &id, "confirmed").await;
    set_status(&state, &id, "completed").await;

    let (status, json) = send(
        &state,
        request("DELETE", &format!("/api/bookings/{id}"), &user("u"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Booking deleted successfully");
    assert!(json.get("booking").is_none());

    let (status, _) = send(
        &state,
        request("GET", &format!("/api/bookings/{id}"), &user("u"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_by_stranger_is_not_found() {
    let state = test_state();
    let id = create(&state, &user("u")).await;

    let (status, _) = send(
        &state,
        request("DELETE", &format!("/api/bookings/{id}"), &user("v"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &state,
        request("GET", &format!("/api/bookings/{id}"), &user("u"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// ── CORS ──

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/bookings")
                .header("Origin", "http://localhost:8081")
                .header("Access-Control-Request-Method", "PATCH")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:8081")
    );
}
