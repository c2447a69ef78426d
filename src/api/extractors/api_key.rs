use axum::{
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
};
use std::collections::HashMap;
use std::sync::Arc;
use crate::domain::models::business::Business;
use crate::state::AppState;

/// Admin authorization for business-scoped routes: the X-Api-Key header must
/// match the api_secret issued when the business was created. Resolves to the
/// full business row so handlers don't re-fetch it.
pub struct ApiKey(pub Business);

impl FromRequestParts<Arc<AppState>> for ApiKey {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let params: Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        let business_id = params.get("business_id").ok_or(StatusCode::BAD_REQUEST)?;

        let provided = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let business = match state.business_repo.find_by_id(business_id).await {
            Ok(Some(b)) => b,
            Ok(None) => return Err(StatusCode::NOT_FOUND),
            Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
        };

        if business.api_secret != provided {
            return Err(StatusCode::UNAUTHORIZED);
        }

        Ok(ApiKey(business))
    }
}
