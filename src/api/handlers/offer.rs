use axum::{extract::{State, Path}, response::IntoResponse, Json};
use std::sync::Arc;
use serde_json::json;
use tracing::info;

use crate::state::AppState;
use crate::api::extractors::api_key::ApiKey;
use crate::error::AppError;

pub async fn list_cleaner_offers(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, cleaner_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.cleaner_repo.find_by_id(&business.id, &cleaner_id).await?
        .ok_or(AppError::NotFound("Cleaner not found".into()))?;

    let offers = state.offer_repo.list_pending_by_cleaner(&cleaner_id).await?;
    Ok(Json(offers))
}

pub async fn list_booking_offers(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.booking_repo.find_by_id(&business.id, &booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    let offers = state.offer_repo.list_by_booking(&booking_id).await?;
    Ok(Json(offers))
}

pub async fn accept_offer(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, offer_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let offer = state.offer_repo.find_by_id(&offer_id).await?
        .ok_or(AppError::NotFound("Offer not found".into()))?;

    // Scope check before any write.
    state.booking_repo.find_by_id(&business.id, &offer.booking_id).await?
        .ok_or(AppError::NotFound("Offer not found".into()))?;

    let accepted = state.offer_repo.accept(&offer_id).await?;
    info!("Offer accepted: {} (booking {} -> cleaner {})", accepted.id, accepted.booking_id, accepted.cleaner_id);
    Ok(Json(accepted))
}

/// A declined offer is terminal; the job goes back out to whoever is left in
/// the pool (every cleaner who has declined so far stays excluded).
pub async fn reject_offer(
    State(state): State<Arc<AppState>>,
    ApiKey(business): ApiKey,
    Path((_, offer_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let offer = state.offer_repo.find_by_id(&offer_id).await?
        .ok_or(AppError::NotFound("Offer not found".into()))?;

    let booking = state.booking_repo.find_by_id(&business.id, &offer.booking_id).await?
        .ok_or(AppError::NotFound("Offer not found".into()))?;

    let rejected = state.offer_repo.reject(&offer_id).await?;
    info!("Offer rejected: {} (booking {}, cleaner {})", rejected.id, rejected.booking_id, rejected.cleaner_id);

    let exclude = state.offer_repo.list_rejected_cleaner_ids(&booking.id).await?;
    let offers_created = state.dispatch.broadcast(&business, &booking, &exclude).await?;

    Ok(Json(json!({ "offer": rejected, "offers_created": offers_created })))
}
