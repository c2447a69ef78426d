mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::TestApp;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_cleaner(app: &TestApp, bid: &str, secret: &str, name: &str, rating: i32) -> String {
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/cleaners", bid))
            .header("X-Api-Key", secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({
                "name": name,
                "email": format!("{}@example.com", name.to_lowercase()),
                "rating": rating
            }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    parse_body(res).await["id"].as_str().unwrap().to_string()
}

async fn put_weekly(app: &TestApp, bid: &str, secret: &str, cleaner_id: &str, days: Value) {
    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri(format!("/api/v1/{}/cleaners/{}/schedule", bid, cleaner_id))
            .header("X-Api-Key", secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"days": days}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

async fn check(app: &TestApp, bid: &str, secret: &str, datetime: &str) -> Value {
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/availability/check", bid))
            .header("X-Api-Key", secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"datetime": datetime}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    parse_body(res).await
}

// 2027-06-07 is a Monday, 2027-06-08 a Tuesday.

#[tokio::test]
async fn test_weekly_window_resolution() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("avail", "UTC").await;
    let cleaner_id = create_cleaner(&app, &bid, &secret, "Ana", 4).await;
    put_weekly(&app, &bid, &secret, &cleaner_id, json!([
        {"weekday": "Monday", "start": "09:00", "end": "17:00"}
    ])).await;

    // Inside the Monday window.
    let body = check(&app, &bid, &secret, "2027-06-07 10:00:00").await;
    assert_eq!(body["available"], true);
    assert_eq!(body["timeslot"], "2027-06-07 10:00:00");

    // Before the window opens.
    let body = check(&app, &bid, &secret, "2027-06-07 08:00:00").await;
    assert_eq!(body["available"], false);

    // Tuesday has no weekly record at all.
    let body = check(&app, &bid, &secret, "2027-06-08 10:00:00").await;
    assert_eq!(body["available"], false);
}

#[tokio::test]
async fn test_requests_are_truncated_to_whole_hours() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("avail-trunc", "UTC").await;
    let cleaner_id = create_cleaner(&app, &bid, &secret, "Ana", 4).await;
    put_weekly(&app, &bid, &secret, &cleaner_id, json!([
        {"weekday": "Monday", "start": "09:00", "end": "17:00"}
    ])).await;

    let body = check(&app, &bid, &secret, "2027-06-07 10:45:00").await;
    assert_eq!(body["timeslot"], "2027-06-07 10:00:00");
    assert_eq!(body["available"], true);
}

#[tokio::test]
async fn test_off_day_exception_overrides_weekly_window() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("avail-off", "UTC").await;
    let cleaner_id = create_cleaner(&app, &bid, &secret, "Ana", 4).await;
    put_weekly(&app, &bid, &secret, &cleaner_id, json!([
        {"weekday": "Monday", "start": "09:00", "end": "17:00"}
    ])).await;

    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri(format!("/api/v1/{}/cleaners/{}/exceptions", bid, cleaner_id))
            .header("X-Api-Key", &secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"date": "2027-06-07", "off_day": true}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Off-day wins regardless of the weekly window, the whole day.
    for time in ["09:00:00", "12:00:00", "16:59:00"] {
        let body = check(&app, &bid, &secret, &format!("2027-06-07 {}", time)).await;
        assert_eq!(body["available"], false, "off day must suppress {}", time);
    }

    // The following Monday is unaffected.
    let body = check(&app, &bid, &secret, "2027-06-14 10:00:00").await;
    assert_eq!(body["available"], true);
}

#[tokio::test]
async fn test_date_exception_replaces_hours_for_that_date() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("avail-swap", "UTC").await;
    let cleaner_id = create_cleaner(&app, &bid, &secret, "Ana", 4).await;
    put_weekly(&app, &bid, &secret, &cleaner_id, json!([
        {"weekday": "Monday", "start": "09:00", "end": "17:00"}
    ])).await;

    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri(format!("/api/v1/{}/cleaners/{}/exceptions", bid, cleaner_id))
            .header("X-Api-Key", &secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"date": "2027-06-07", "start": "13:00", "end": "15:00"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The weekly morning no longer applies on the exception date.
    let body = check(&app, &bid, &secret, "2027-06-07 10:00:00").await;
    assert_eq!(body["available"], false);

    let body = check(&app, &bid, &secret, "2027-06-07 14:00:00").await;
    assert_eq!(body["available"], true);
}

#[tokio::test]
async fn test_unavailable_slot_suggests_alternates() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("avail-alt", "UTC").await;
    let cleaner_id = create_cleaner(&app, &bid, &secret, "Ana", 4).await;
    put_weekly(&app, &bid, &secret, &cleaner_id, json!([
        {"weekday": "Monday", "start": "09:00", "end": "17:00"}
    ])).await;

    // 07:00 is outside the window; the walk should land inside it.
    let body = check(&app, &bid, &secret, "2027-06-07 07:00:00").await;
    assert_eq!(body["available"], false);

    let alternates = body["alternates"].as_array().unwrap();
    assert!(!alternates.is_empty());
    assert!(alternates.len() <= 3);
    assert_eq!(alternates[0], "2027-06-07 09:00:00");
}

#[tokio::test]
async fn test_empty_roster_is_unavailable_not_an_error() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("avail-empty", "UTC").await;

    let body = check(&app, &bid, &secret, "2027-06-07 10:00:00").await;
    assert_eq!(body["available"], false);
    assert!(body["alternates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_datetime_is_a_client_error() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("avail-bad", "UTC").await;

    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/availability/check", bid))
            .header("X-Api-Key", &secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"datetime": "next tuesday-ish"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/availability/check", bid))
            .header("X-Api-Key", &secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
