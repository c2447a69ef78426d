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

async fn book(app: &TestApp, bid: &str, date: &str, time: &str) -> Value {
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/bookings", bid))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({
                "date": date, "time": time,
                "name": "Customer", "email": "customer@example.com"
            }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    parse_body(res).await
}

async fn booking_offers(app: &TestApp, bid: &str, secret: &str, booking_id: &str) -> Vec<Value> {
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri(format!("/api/v1/{}/bookings/{}/offers", bid, booking_id))
            .header("X-Api-Key", secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    parse_body(res).await.as_array().unwrap().clone()
}

async fn set_policy(app: &TestApp, bid: &str, secret: &str, policy: &str) {
    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri(format!("/api/v1/{}", bid))
            .header("X-Api-Key", secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"assignment_policy": policy}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// 2027-06-07 is a Monday.

#[tokio::test]
async fn test_rebroadcast_is_idempotent() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("off-idem", "UTC").await;
    for name in ["Ana", "Bo"] {
        let id = create_cleaner(&app, &bid, &secret, name, 4).await;
        put_weekly(&app, &bid, &secret, &id, json!([
            {"weekday": "Monday", "start": "09:00", "end": "17:00"}
        ])).await;
    }

    let body = book(&app, &bid, "2027-06-07", "10:00").await;
    assert_eq!(body["offers_created"].as_u64().unwrap(), 2);
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();

    // Broadcasting again creates nothing new.
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/bookings/{}/broadcast", bid, booking_id))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["offers_created"].as_u64().unwrap(), 0);

    assert_eq!(booking_offers(&app, &bid, &secret, &booking_id).await.len(), 2);
}

#[tokio::test]
async fn test_high_rated_policy_offers_only_to_top_ties() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("off-rated", "UTC").await;
    set_policy(&app, &bid, &secret, "high_rated").await;

    let mut by_rating = std::collections::HashMap::new();
    for (name, rating) in [("Ana", 3), ("Bo", 5), ("Cy", 5), ("Dee", 4)] {
        let id = create_cleaner(&app, &bid, &secret, name, rating).await;
        put_weekly(&app, &bid, &secret, &id, json!([
            {"weekday": "Monday", "start": "09:00", "end": "17:00"}
        ])).await;
        by_rating.insert(id, rating);
    }

    let body = book(&app, &bid, "2027-06-07", "10:00").await;
    assert_eq!(body["offers_created"].as_u64().unwrap(), 2);

    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();
    let offers = booking_offers(&app, &bid, &secret, &booking_id).await;
    assert_eq!(offers.len(), 2);
    for offer in &offers {
        let cleaner_id = offer["cleaner_id"].as_str().unwrap();
        assert_eq!(by_rating[cleaner_id], 5, "only max-rated cleaners get offers");
        assert_eq!(offer["assignment_type"], "high_rated");
    }
}

#[tokio::test]
async fn test_accept_assigns_cleaner_and_closes_the_race() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("off-accept", "UTC").await;
    for name in ["Ana", "Bo"] {
        let id = create_cleaner(&app, &bid, &secret, name, 4).await;
        put_weekly(&app, &bid, &secret, &id, json!([
            {"weekday": "Monday", "start": "09:00", "end": "17:00"}
        ])).await;
    }

    let body = book(&app, &bid, "2027-06-07", "10:00").await;
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();
    let offers = booking_offers(&app, &bid, &secret, &booking_id).await;
    assert_eq!(offers.len(), 2);

    let first = offers[0]["id"].as_str().unwrap();
    let second = offers[1]["id"].as_str().unwrap();

    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/offers/{}/accept", bid, first))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let accepted = parse_body(res).await;
    assert_eq!(accepted["status"], "ACCEPTED");

    // The booking now carries the accepting cleaner.
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri(format!("/api/v1/{}/bookings/{}", bid, booking_id))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let booking = parse_body(res).await;
    assert_eq!(booking["cleaner_id"], accepted["cleaner_id"]);

    // The slower cleaner cannot also win the job.
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/offers/{}/accept", bid, second))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reject_is_terminal_and_rebroadcasts_to_remaining_pool() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("off-reject", "UTC").await;
    let ana = create_cleaner(&app, &bid, &secret, "Ana", 4).await;
    let bo = create_cleaner(&app, &bid, &secret, "Bo", 4).await;
    for id in [&ana, &bo] {
        put_weekly(&app, &bid, &secret, id, json!([
            {"weekday": "Monday", "start": "09:00", "end": "17:00"}
        ])).await;
    }

    // Keep Bo off the first broadcast with a date exception.
    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri(format!("/api/v1/{}/cleaners/{}/exceptions", bid, bo))
            .header("X-Api-Key", &secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"date": "2027-06-07", "off_day": true}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = book(&app, &bid, "2027-06-07", "10:00").await;
    assert_eq!(body["offers_created"].as_u64().unwrap(), 1);
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();

    let offers = booking_offers(&app, &bid, &secret, &booking_id).await;
    let ana_offer = offers[0]["id"].as_str().unwrap().to_string();
    assert_eq!(offers[0]["cleaner_id"].as_str().unwrap(), ana);

    // Bo becomes available again before Ana declines.
    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/api/v1/{}/cleaners/{}/exceptions/2027-06-07", bid, bo))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/offers/{}/reject", bid, ana_offer))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["offer"]["status"], "REJECTED");
    assert_eq!(body["offers_created"].as_u64().unwrap(), 1, "Bo should get the re-broadcast");

    let offers = booking_offers(&app, &bid, &secret, &booking_id).await;
    assert_eq!(offers.len(), 2);
    let bo_offer = offers.iter().find(|o| o["cleaner_id"] == bo.as_str()).unwrap();
    assert_eq!(bo_offer["status"], "PENDING");

    // Terminal: a second reject is refused.
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/offers/{}/reject", bid, ana_offer))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancelling_booking_withdraws_pending_offers() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("off-cancel", "UTC").await;
    let ana = create_cleaner(&app, &bid, &secret, "Ana", 4).await;
    put_weekly(&app, &bid, &secret, &ana, json!([
        {"weekday": "Monday", "start": "09:00", "end": "17:00"}
    ])).await;

    let body = book(&app, &bid, "2027-06-07", "10:00").await;
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["offers_created"].as_u64().unwrap(), 1);

    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/api/v1/{}/bookings/{}", bid, booking_id))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let offers = booking_offers(&app, &bid, &secret, &booking_id).await;
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0]["status"], "WITHDRAWN");

    // A withdrawn offer cannot be accepted.
    let offer_id = offers[0]["id"].as_str().unwrap();
    let res = app.router.clone().oneshot(
        Request::builder().method("POST").uri(format!("/api/v1/{}/offers/{}/accept", bid, offer_id))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pending_offers_visible_per_cleaner() {
    let app = TestApp::new().await;
    let (bid, secret) = app.create_business("off-list", "UTC").await;
    let ana = create_cleaner(&app, &bid, &secret, "Ana", 4).await;
    put_weekly(&app, &bid, &secret, &ana, json!([
        {"weekday": "Monday", "start": "09:00", "end": "17:00"}
    ])).await;

    book(&app, &bid, "2027-06-07", "10:00").await;
    book(&app, &bid, "2027-06-07", "13:00").await;

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri(format!("/api/v1/{}/cleaners/{}/offers", bid, ana))
            .header("X-Api-Key", &secret)
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let offers = parse_body(res).await;
    assert_eq!(offers.as_array().unwrap().len(), 2);
}
