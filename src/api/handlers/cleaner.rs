use axum::{extract::{State, Path}, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;
use crate::api::extractors::api_key::ApiKey;
use crate::api::dtos::requests::{CreateCleanerRequest, UpdateCleanerRequest};
use crate::domain::models::cleaner::Cleaner;
use crate::error::AppError;

pub async fn create_cleaner(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Json(payload): Json<CreateCleanerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let cleaner = Cleaner::new(
        business.id.clone(),
        payload.name,
        payload.email,
        payload.phone,
        payload.rating.unwrap_or(0),
    );

    let created = state.cleaner_repo.create(&cleaner).await?;
    info!("Cleaner created: {} for business {}", created.id, business.id);
    Ok(Json(created))
}

pub async fn list_cleaners(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
) -> Result<impl IntoResponse, AppError> {
    let cleaners = state.cleaner_repo.list_by_business(&business.id).await?;
    Ok(Json(cleaners))
}

pub async fn get_cleaner(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, cleaner_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let cleaner = state.cleaner_repo.find_by_id(&business.id, &cleaner_id).await?
        .ok_or(AppError::NotFound("Cleaner not found".into()))?;
    Ok(Json(cleaner))
}

pub async fn update_cleaner(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, cleaner_id)): Path<(String, String)>,
    Json(payload): Json<UpdateCleanerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut cleaner = state.cleaner_repo.find_by_id(&business.id, &cleaner_id).await?
        .ok_or(AppError::NotFound("Cleaner not found".into()))?;

    if let Some(name) = payload.name { cleaner.name = name; }
    if let Some(email) = payload.email { cleaner.email = email; }
    if let Some(phone) = payload.phone {
        cleaner.phone = if phone.is_empty() { None } else { Some(phone) };
    }
    if let Some(rating) = payload.rating { cleaner.rating = rating; }
    if let Some(active) = payload.is_active { cleaner.is_active = active; }

    let updated = state.cleaner_repo.update(&cleaner).await?;
    info!("Cleaner updated: {}", updated.id);
    Ok(Json(updated))
}

pub async fn delete_cleaner(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, cleaner_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.cleaner_repo.delete(&business.id, &cleaner_id).await?;
    info!("Cleaner deleted: {}", cleaner_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
