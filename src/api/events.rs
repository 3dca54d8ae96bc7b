//! Event roster endpoints.

use axum::extract::{Path, State};

use super::{success, ApiJson, ApiQuery, ApiResult};
use crate::models::{CreateEventRequest, DeleteEventQuery, Event};
use crate::AppState;

/// GET /api/events - The event roster.
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Vec<Event>> {
    success(state.festival.list_events().await?)
}

/// POST /api/admin/events - Add an event and give every unit a zero score for it.
pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> ApiResult<Event> {
    match state.festival.add_event(&request.name).await {
        Ok(event) => success(event),
        Err(e) => {
            tracing::warn!("Error adding event {:?}: {}", request.name, e);
            Err(e)
        }
    }
}

/// DELETE /api/admin/events/:id - Remove an event and its scores.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<DeleteEventQuery>,
) -> ApiResult<()> {
    match state.festival.delete_event(&id, params.name.as_deref()).await {
        Ok(()) => success(()),
        Err(e) => {
            tracing::warn!("Error deleting event {}: {}", id, e);
            Err(e)
        }
    }
}
