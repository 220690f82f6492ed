// libs/booking-cell/tests/router_test.rs
mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use tower::ServiceExt;

use booking_cell::handlers::BookingState;
use booking_cell::models::BookingRules;
use booking_cell::router::{booking_routes, review_routes};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

use common::{local_harness, LocalHarness};

struct TestApp {
    app: Router,
    harness: LocalHarness,
}

async fn test_app() -> TestApp {
    let harness = local_harness().await;
    let state = BookingState::new(
        Arc::new(harness.config.clone()),
        harness.store.clone(),
        harness.notifier.clone(),
    );
    let state = Arc::new(state);
    let app = Router::new()
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/reviews", review_routes(state));

    TestApp { app, harness }
}

/// A bookable day a few days ahead of the real clock, since handlers use `Utc::now()`.
fn upcoming_open_day() -> NaiveDate {
    let mut date = BookingRules::default().local_today(Utc::now()) + Duration::days(3);
    if date.weekday() == Weekday::Sun {
        date += Duration::days(1);
    }
    date
}

fn booking_body(date: NaiveDate, time: &str) -> Value {
    json!({
        "serviceId": "11",
        "specialistId": "3",
        "date": date.to_string(),
        "time": time,
        "firstName": "Ana",
        "lastName": "Petrova",
        "email": "ana@example.com",
        "phone": "+359 88 123 4567"
    })
}

fn admin_token() -> String {
    JwtTestUtils::create_test_token(
        &TestUser::admin("owner@salon.test"),
        &TestConfig::default().jwt_secret,
        None,
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn catalog_is_public() {
    let t = test_app().await;

    let (status, services) = send(&t.app, get("/bookings/services")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(services.as_array().unwrap().len(), 14);

    let (status, specialists) = send(&t.app, get("/bookings/specialists")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(specialists[0]["name"], "Miglena Todorova");
}

#[tokio::test]
async fn slots_require_a_valid_date() {
    let t = test_app().await;

    let (status, body) = send(&t.app, get("/bookings/slots")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(&t.app, get("/bookings/slots?date=01-12-2025")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submission_books_the_slot() {
    let t = test_app().await;
    let date = upcoming_open_day();

    let (status, body) = send(&t.app, json_request("POST", "/bookings", &booking_body(date, "14:00"), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Booking request sent! We will contact you shortly.");

    let (status, slots) = send(&t.app, get(&format!("/bookings/slots?date={}&specialist_id=3", date))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slots["booked_slots"], json!(["14:00"]));
    assert_eq!(slots["free_slots"].as_array().unwrap().len(), 15);

    let (status, body) = send(&t.app, json_request("POST", "/bookings", &booking_body(date, "14:00"), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "This time slot is already taken. Please choose another time");
}

#[tokio::test]
async fn invalid_submission_explains_itself() {
    let t = test_app().await;

    let (status, body) = send(
        &t.app,
        json_request("POST", "/bookings", &booking_body(upcoming_open_day(), "09:30"), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Please select a time between 10:00 and 18:00");

    let (status, body) = send(&t.app, json_request("POST", "/bookings", &json!({}), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please fill in all fields");
}

#[tokio::test]
async fn malformed_bodies_keep_the_response_shape() {
    let t = test_app().await;
    let invalid = "Invalid request. Please check your input and try again.";

    let (status, body) = send(&t.app, json_request("POST", "/bookings", &json!({ "serviceId": 11 }), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": invalid }));

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/bookings")
        .body(Body::from(booking_body(upcoming_open_day(), "14:00").to_string()))
        .unwrap();
    let (status, body) = send(&t.app, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let truncated = Request::builder()
        .method("POST")
        .uri("/bookings")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"serviceId\": "))
        .unwrap();
    let (status, body) = send(&t.app, truncated).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], invalid);

    assert!(t.harness.store.list_bookings(&Default::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_admin_input_keeps_the_response_shape() {
    let t = test_app().await;
    let token = admin_token();

    let (status, body) = send(
        &t.app,
        json_request("PATCH", "/bookings/admin/not-a-uuid/status", &json!({ "status": "approved" }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid request. Please check your input and try again.");

    let uri = format!("/bookings/admin/{}/status", uuid::Uuid::new_v4());
    let (status, body) = send(&t.app, json_request("PATCH", &uri, &json!({ "status": "maybe" }), Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send(&t.app, authed_get("/bookings/admin?status=maybe", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_catalog_ids_are_client_errors() {
    let t = test_app().await;
    let mut body = booking_body(upcoming_open_day(), "14:00");
    body["serviceId"] = json!("no-such-service");

    let (status, response) = send(&t.app, json_request("POST", "/bookings", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "Please choose a valid service");

    let mut body = booking_body(upcoming_open_day(), "14:00");
    body["specialistId"] = json!("1");
    let (status, response) = send(&t.app, json_request("POST", "/bookings", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "Please choose a specialist who offers this service");
}

#[tokio::test]
async fn approval_link_redirects_and_tolerates_repeats() {
    let t = test_app().await;
    send(&t.app, json_request("POST", "/bookings", &booking_body(upcoming_open_day(), "11:00"), None)).await;
    let link = t.harness.notifier.last_link().unwrap();
    let token = link.split("token=").nth(1).unwrap();
    let uri = format!("/bookings/approve?token={}", token);

    let response = t.app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "https://www.salon.test/booking/confirmed");

    let response = t.app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://www.salon.test/booking/confirmed?already=true"
    );
    assert_eq!(t.harness.notifier.client_count(), 1);

    assert!(link.starts_with("https://salon.test/bookings/approve?token="));

    let (status, _) = send(&t.app, get("/bookings/approve")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, get("/bookings/approve?token=unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let t = test_app().await;

    let (status, _) = send(&t.app, get("/bookings/admin")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let client_token = JwtTestUtils::create_test_token(
        &TestUser::client("ana@example.com"),
        &TestConfig::default().jwt_secret,
        None,
    );
    let (status, _) = send(&t.app, authed_get("/bookings/admin", &client_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&t.app, authed_get("/bookings/admin", &admin_token())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn admin_decides_bookings() {
    let t = test_app().await;
    let token = admin_token();
    send(&t.app, json_request("POST", "/bookings", &booking_body(upcoming_open_day(), "12:00"), None)).await;

    let (_, list) = send(&t.app, authed_get("/bookings/admin?status=pending", &token)).await;
    let id = list[0]["id"].as_str().unwrap().to_string();
    assert_eq!(list[0]["service_name"], "Gel Manicure");
    assert_eq!(list[0]["specialist_name"], "Galina Petrova");

    let uri = format!("/bookings/admin/{}/status", id);
    let (status, body) = send(&t.app, json_request("PATCH", &uri, &json!({ "status": "approved" }), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Booking approved");

    let (status, body) = send(&t.app, json_request("PATCH", &uri, &json!({ "status": "rejected" }), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Booking was already approved");

    let (_, pending) = send(&t.app, authed_get("/bookings/admin?status=pending", &token)).await;
    assert_eq!(pending, json!([]));
    assert_eq!(t.harness.notifier.client_count(), 1);
}

#[tokio::test]
async fn admin_manages_specialists() {
    let t = test_app().await;
    let token = admin_token();
    let specialist = json!({
        "id": "4",
        "name": "Vesela",
        "role": "Stylist",
        "bio": "Color and cuts."
    });

    let (status, body) = send(&t.app, json_request("PUT", "/bookings/admin/specialists", &specialist, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Specialist saved successfully");

    let (_, specialists) = send(&t.app, get("/bookings/specialists")).await;
    assert_eq!(specialists.as_array().unwrap().len(), 4);

    let delete = Request::builder()
        .method("DELETE")
        .uri("/bookings/admin/specialists/4")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&t.app, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Specialist removed");

    let delete_again = Request::builder()
        .method("DELETE")
        .uri("/bookings/admin/specialists/4")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&t.app, delete_again).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn specialist_with_bookings_is_kept() {
    let t = test_app().await;
    let token = admin_token();
    send(&t.app, json_request("POST", "/bookings", &booking_body(upcoming_open_day(), "13:00"), None)).await;

    let delete = Request::builder()
        .method("DELETE")
        .uri("/bookings/admin/specialists/3")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&t.app, delete).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "This specialist has bookings and cannot be removed");
    let (_, specialists) = send(&t.app, get("/bookings/specialists")).await;
    assert_eq!(specialists.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn reviews_are_public_and_moderated() {
    let t = test_app().await;

    let (status, reviews) = send(&t.app, get("/reviews")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().unwrap().len(), 3);
    assert_eq!(reviews[0]["client_name"], "Sarah Davis");

    let review = json!({ "name": "Ana Petrova", "rating": 5, "comment": "Perfect gel manicure." });
    let (status, body) = send(&t.app, json_request("POST", "/reviews", &review, None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Review submitted successfully!");

    // Pending until moderated.
    let (_, reviews) = send(&t.app, get("/reviews")).await;
    assert_eq!(reviews.as_array().unwrap().len(), 3);
    assert_eq!(t.harness.store.list_reviews().await.unwrap().len(), 4);

    let (status, body) = send(&t.app, json_request("POST", "/reviews", &json!({ "name": "Ana" }), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please fill in all fields");

    let too_high = json!({ "name": "Ana", "rating": 9, "comment": "Wow" });
    let (status, body) = send(&t.app, json_request("POST", "/reviews", &too_high, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please choose a rating between 1 and 5");
}
