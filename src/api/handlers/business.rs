use axum::{extract::{State, Path}, response::IntoResponse, Json};
use std::sync::Arc;
use chrono_tz::Tz;
use tracing::info;

use crate::state::AppState;
use crate::api::extractors::api_key::ApiKey;
use crate::api::dtos::requests::{CreateBusinessRequest, UpdateBusinessRequest};
use crate::api::dtos::responses::BusinessCreatedResponse;
use crate::domain::models::business::Business;
use crate::error::AppError;

pub async fn create_business(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBusinessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let timezone = payload.timezone.unwrap_or_else(|| "UTC".to_string());
    if timezone.parse::<Tz>().is_err() {
        return Err(AppError::Validation(format!("Unknown timezone: {}", timezone)));
    }

    let business = Business::new(payload.name, payload.slug, timezone);
    let created = state.business_repo.create(&business).await?;

    info!("Business created: {} ({})", created.id, created.slug);
    Ok(Json(BusinessCreatedResponse {
        business_id: created.id,
        slug: created.slug,
        api_secret: created.api_secret,
    }))
}

pub async fn get_business_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let business = state.business_repo.find_by_slug(&slug).await?
        .ok_or(AppError::NotFound("Business not found".into()))?;
    Ok(Json(business))
}

pub async fn get_business(
    ApiKey(business): ApiKey,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(business))
}

pub async fn update_business(
    State(state): State<Arc<AppState>>,
    ApiKey(mut business): ApiKey,
    Json(payload): Json<UpdateBusinessRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(name) = payload.name {
        business.name = name;
    }
    if let Some(timezone) = payload.timezone {
        if timezone.parse::<Tz>().is_err() {
            return Err(AppError::Validation(format!("Unknown timezone: {}", timezone)));
        }
        business.timezone = timezone;
    }
    if let Some(policy) = payload.assignment_policy {
        if policy != "all_available" && policy != "high_rated" {
            return Err(AppError::Validation("assignment_policy must be 'all_available' or 'high_rated'".into()));
        }
        business.assignment_policy = policy;
    }
    if let Some(start) = payload.hours_start {
        business.hours_start = start;
    }
    if let Some(end) = payload.hours_end {
        business.hours_end = end;
    }
    if business.hours_start < 0 || business.hours_end > 24 || business.hours_start >= business.hours_end {
        return Err(AppError::Validation("Business hours must satisfy 0 <= start < end <= 24".into()));
    }

    let updated = state.business_repo.update(&business).await?;
    info!("Business updated: {}", updated.id);
    Ok(Json(updated))
}
