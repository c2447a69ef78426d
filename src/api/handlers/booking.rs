use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::state::AppState;
use crate::api::extractors::{api_key::ApiKey, business::BusinessId};
use crate::api::dtos::requests::CreateBookingRequest;
use crate::api::dtos::responses::BroadcastResponse;
use crate::domain::models::booking::{Booking, NewBookingParams};
use crate::domain::services::scheduling::AssignmentPolicy;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct CreateBookingQuery {
    pub assign: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    Query(query): Query<CreateBookingQuery>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let business = state.business_repo.find_by_id(&business_id).await?
        .ok_or(AppError::NotFound("Business not found".into()))?;

    let tz: Tz = business.timezone.parse().unwrap_or(chrono_tz::UTC);

    let date = NaiveDate::parse_from_str(&payload.date, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidTimeInput("Invalid date format".into()))?;

    let time = if payload.time.contains('T') {
        let dt = chrono::DateTime::parse_from_rfc3339(&payload.time)
            .map_err(|_| AppError::InvalidTimeInput("Invalid ISO time format".into()))?;
        dt.with_timezone(&tz).time()
    } else {
        NaiveTime::parse_from_str(&payload.time, "%H:%M")
            .map_err(|_| AppError::InvalidTimeInput("Invalid time format (HH:MM)".into()))?
    };

    let naive_dt = date.and_time(time);

    let start_time = tz.from_local_datetime(&naive_dt)
        .single()
        .ok_or(AppError::InvalidTimeInput("Invalid local time (ambiguous or skipped due to DST)".into()))?
        .with_timezone(&Utc);

    if start_time < Utc::now() {
        return Err(AppError::Validation("Cannot book in the past".into()));
    }

    // The policy decides who gets offered the job, not whether the slot is
    // bookable, so the intake check runs against the full active roster.
    let available = state.dispatch
        .available_at(&business, naive_dt, &[], Some(AssignmentPolicy::AllAvailable))
        .await?;
    if available.is_empty() {
        let check = state.dispatch.check_slot(&business, naive_dt).await?;
        warn!("Booking rejected: no cleaner available at {} for business {}", naive_dt, business.id);
        return Ok((
            StatusCode::CONFLICT,
            Json(json!({
                "error": "No cleaner is available at the requested time",
                "alternates": check.alternates.iter()
                    .map(|s| s.format("%Y-%m-%d %H:%M:%S").to_string())
                    .collect::<Vec<_>>(),
            })),
        ).into_response());
    }

    let booking = Booking::new(NewBookingParams {
        business_id: business.id.clone(),
        start: start_time,
        duration_min: payload.duration_min.unwrap_or(60),
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
    });

    let created = state.booking_repo.create(&booking).await?;
    info!("Booking created: {} for business {}", created.id, business.id);

    // Direct assignment on request; the default hands the job to the policy
    // pool as open offers.
    if query.assign.as_deref() == Some("direct") {
        let assigned = state.dispatch.assign_best(&business, &created, &[]).await?;
        let body = match assigned {
            Some(cleaner) => json!({ "booking": created, "assigned_cleaner": cleaner.id }),
            None => json!({ "booking": created, "assigned_cleaner": null }),
        };
        return Ok(Json(body).into_response());
    }

    let offers_created = state.dispatch.broadcast(&business, &created, &[]).await?;
    Ok(Json(json!({ "booking": created, "offers_created": offers_created })).into_response())
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_by_business(&business.id).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&business.id, &booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let cancelled = state.booking_repo.cancel(&business.id, &booking_id).await?;
    info!("Booking cancelled: {}", cancelled.id);
    Ok(Json(cancelled))
}

pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let completed = state.booking_repo.complete(&business.id, &booking_id).await?;
    info!("Booking completed: {}", completed.id);
    Ok(Json(completed))
}

/// Manual (re-)broadcast. Cleaners who already declined are left out of the
/// pool, and cleaners who already hold an offer are skipped, so repeating the
/// call is harmless.
pub async fn broadcast_booking(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&business.id, &booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    if booking.status != crate::domain::models::booking::STATUS_CONFIRMED {
        return Err(AppError::Conflict("Booking is not open".into()));
    }

    let exclude = state.offer_repo.list_rejected_cleaner_ids(&booking.id).await?;
    let offers_created = state.dispatch.broadcast(&business, &booking, &exclude).await?;

    Ok(Json(BroadcastResponse { offers_created }))
}
