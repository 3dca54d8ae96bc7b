//! Venue announcement endpoints.

use axum::extract::{Path, State};

use super::{success, ApiJson, ApiResult};
use crate::models::{VenueDetails, VenueRequest};
use crate::AppState;

/// GET /api/venue - Venue history, newest first.
pub async fn list_venue(State(state): State<AppState>) -> ApiResult<Vec<VenueDetails>> {
    success(state.festival.list_venue().await?)
}

/// GET /api/venue/current - The venue shown to visitors. 404 until one is announced.
pub async fn get_current_venue(State(state): State<AppState>) -> ApiResult<VenueDetails> {
    success(state.festival.current_venue().await?)
}

/// POST /api/admin/venue - Add an announcement.
pub async fn create_venue(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VenueRequest>,
) -> ApiResult<VenueDetails> {
    success(state.festival.add_venue(&request).await?)
}

/// PUT /api/admin/venue/:id - Replace an announcement.
pub async fn update_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<VenueRequest>,
) -> ApiResult<VenueDetails> {
    success(state.festival.update_venue(&id, &request).await?)
}

/// DELETE /api/admin/venue/:id - Remove an announcement.
pub async fn delete_venue(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.festival.delete_venue(&id).await?;
    success(())
}
