use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, business, cleaner, schedule, availability, booking, offer};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Business onboarding
        .route("/api/v1/businesses", post(business::create_business))
        .route("/api/v1/businesses/by-slug/{slug}", get(business::get_business_by_slug))
        .route("/api/v1/{business_id}", get(business::get_business).put(business::update_business))

        // Roster
        .route("/api/v1/{business_id}/cleaners", post(cleaner::create_cleaner).get(cleaner::list_cleaners))
        .route("/api/v1/{business_id}/cleaners/{cleaner_id}", get(cleaner::get_cleaner).put(cleaner::update_cleaner).delete(cleaner::delete_cleaner))

        // Working hours
        .route("/api/v1/{business_id}/cleaners/{cleaner_id}/schedule", get(schedule::list_schedule).put(schedule::put_weekly_schedule))
        .route("/api/v1/{business_id}/cleaners/{cleaner_id}/exceptions", put(schedule::put_exception))
        .route("/api/v1/{business_id}/cleaners/{cleaner_id}/exceptions/{date}", delete(schedule::delete_exception))

        // Availability probe
        .route("/api/v1/{business_id}/availability/check", post(availability::check_availability))

        // Bookings
        .route("/api/v1/{business_id}/bookings", post(booking::create_booking).get(booking::list_bookings))
        .route("/api/v1/{business_id}/bookings/{booking_id}", get(booking::get_booking).delete(booking::cancel_booking))
        .route("/api/v1/{business_id}/bookings/{booking_id}/complete", post(booking::complete_booking))
        .route("/api/v1/{business_id}/bookings/{booking_id}/broadcast", post(booking::broadcast_booking))
        .route("/api/v1/{business_id}/bookings/{booking_id}/offers", get(offer::list_booking_offers))

        // Offers
        .route("/api/v1/{business_id}/cleaners/{cleaner_id}/offers", get(offer::list_cleaner_offers))
        .route("/api/v1/{business_id}/offers/{offer_id}/accept", post(offer::accept_offer))
        .route("/api/v1/{business_id}/offers/{offer_id}/reject", post(offer::reject_offer))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        business_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
