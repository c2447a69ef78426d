use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use chrono_tz::Tz;
use tracing::info;

use crate::state::AppState;
use crate::api::extractors::api_key::ApiKey;
use crate::api::dtos::requests::CheckAvailabilityRequest;
use crate::api::dtos::responses::CheckAvailabilityResponse;
use crate::domain::services::dispatch::business_tz;
use crate::error::AppError;

const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_local_instant(payload: &CheckAvailabilityRequest, tz: Tz) -> Result<NaiveDateTime, AppError> {
    if let Some(raw) = &payload.datetime {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&tz).naive_local());
        }
        for fmt in [SLOT_FORMAT, "%Y-%m-%d %H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Ok(naive);
            }
        }
        return Err(AppError::InvalidTimeInput(format!("Cannot parse datetime: {}", raw)));
    }

    if let (Some(date), Some(time)) = (&payload.date, &payload.time) {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppError::InvalidTimeInput("Invalid date format (expected YYYY-MM-DD)".into()))?;
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .map_err(|_| AppError::InvalidTimeInput("Invalid time format (expected HH:MM)".into()))?;
        return Ok(date.and_time(time));
    }

    Err(AppError::InvalidTimeInput("A 'datetime' or 'date' + 'time' is required".into()))
}

/// Is anyone free at the requested instant; if not, suggest up to three
/// alternates inside business hours. Requests are forced onto whole-hour
/// slots before checking.
pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Json(payload): Json<CheckAvailabilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tz = business_tz(&business);
    let local = parse_local_instant(&payload, tz)?;
    let probe = local.date().and_hms_opt(local.hour(), 0, 0).unwrap();

    let result = state.dispatch.check_slot(&business, probe).await?;

    info!(
        "check_availability: business {} probe {} -> available={}",
        business.id, probe, result.available
    );

    Ok(Json(CheckAvailabilityResponse {
        available: result.available,
        timeslot: probe.format(SLOT_FORMAT).to_string(),
        alternates: result
            .alternates
            .iter()
            .map(|s| s.format(SLOT_FORMAT).to_string())
            .collect(),
    }))
}
