use axum::{extract::{State, Path}, response::IntoResponse, Json};
use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime};
use tracing::info;

use crate::state::AppState;
use crate::api::extractors::api_key::ApiKey;
use crate::api::dtos::requests::{ExceptionRequest, WeeklyScheduleRequest};
use crate::domain::models::availability::AvailabilityRule;
use crate::error::AppError;

const WEEKDAYS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

fn parse_window(start: Option<&str>, end: Option<&str>, off_day: bool) -> Result<(Option<NaiveTime>, Option<NaiveTime>), AppError> {
    if off_day {
        return Ok((None, None));
    }

    let parse = |label: &str, value: Option<&str>| -> Result<NaiveTime, AppError> {
        let raw = value.ok_or_else(|| AppError::Validation(format!("{} time is required unless off_day is set", label)))?;
        NaiveTime::parse_from_str(raw, "%H:%M")
            .map_err(|_| AppError::Validation(format!("Invalid {} time (expected HH:MM)", label)))
    };

    let start = parse("start", start)?;
    let end = parse("end", end)?;
    if start >= end {
        return Err(AppError::Validation("start time must be before end time".into()));
    }
    Ok((Some(start), Some(end)))
}

pub async fn put_weekly_schedule(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, cleaner_id)): Path<(String, String)>,
    Json(payload): Json<WeeklyScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.cleaner_repo.find_by_id(&business.id, &cleaner_id).await?
        .ok_or(AppError::NotFound("Cleaner not found".into()))?;

    for day in &payload.days {
        if !WEEKDAYS.contains(&day.weekday.as_str()) {
            return Err(AppError::Validation(format!("Unknown weekday: {}", day.weekday)));
        }

        let (start, end) = parse_window(day.start.as_deref(), day.end.as_deref(), day.off_day)?;
        let rule = AvailabilityRule::weekly(cleaner_id.clone(), day.weekday.clone(), start, end, day.off_day);
        state.availability_repo.upsert(&rule).await?;
    }

    let rules = state.availability_repo.list_by_cleaner(&cleaner_id).await?;
    info!("Weekly schedule updated for cleaner {}", cleaner_id);
    Ok(Json(rules))
}

pub async fn list_schedule(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, cleaner_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.cleaner_repo.find_by_id(&business.id, &cleaner_id).await?
        .ok_or(AppError::NotFound("Cleaner not found".into()))?;

    let rules = state.availability_repo.list_by_cleaner(&cleaner_id).await?;
    Ok(Json(rules))
}

pub async fn put_exception(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, cleaner_id)): Path<(String, String)>,
    Json(payload): Json<ExceptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.cleaner_repo.find_by_id(&business.id, &cleaner_id).await?
        .ok_or(AppError::NotFound("Cleaner not found".into()))?;

    let (start, end) = parse_window(payload.start.as_deref(), payload.end.as_deref(), payload.off_day)?;
    let rule = AvailabilityRule::exception(cleaner_id.clone(), payload.date, start, end, payload.off_day);
    let saved = state.availability_repo.upsert(&rule).await?;

    info!("Exception saved for cleaner {} on {}", cleaner_id, payload.date);
    Ok(Json(saved))
}

pub async fn delete_exception(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, cleaner_id, date)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.cleaner_repo.find_by_id(&business.id, &cleaner_id).await?
        .ok_or(AppError::NotFound("Cleaner not found".into()))?;

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format".into()))?;

    state.availability_repo.delete_exception(&cleaner_id, date).await?;
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
