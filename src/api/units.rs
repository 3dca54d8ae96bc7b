//! Unit administration endpoints.

use axum::extract::{Path, State};

use super::{success, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateUnitRequest, Unit, UpdateScoreRequest, UpdateUnitRequest};
use crate::AppState;

/// GET /api/admin/units - All units with credentials, reconciled against the roster.
pub async fn list_units(State(state): State<AppState>) -> ApiResult<Vec<Unit>> {
    success(state.festival.list_units().await?)
}

/// GET /api/admin/units/:id - A single unit.
pub async fn get_unit(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Unit> {
    success(state.festival.get_unit(&id).await?)
}

/// POST /api/admin/units - Register a unit.
pub async fn create_unit(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUnitRequest>,
) -> ApiResult<Unit> {
    let unit = state.festival.add_unit(&request).await?;

    if let Err(e) = state.search.index_unit(&unit).await {
        tracing::warn!("Failed to index unit: {}", e);
    }

    success(unit)
}

/// PUT /api/admin/units/:id - Edit name, theme or credential.
pub async fn update_unit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateUnitRequest>,
) -> ApiResult<Unit> {
    let unit = state.festival.update_unit(&id, &request).await?;

    if request.name.is_some() {
        if let Err(e) = state.search.index_unit(&unit).await {
            tracing::warn!("Failed to re-index unit: {}", e);
        }
    }

    success(unit)
}

/// DELETE /api/admin/units/:id - Delete a unit.
pub async fn delete_unit(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.festival.delete_unit(&id).await?;

    if let Err(e) = state.search.remove_unit(&id).await {
        tracing::warn!("Failed to remove unit from index: {}", e);
    }

    success(())
}

/// PUT /api/admin/units/:id/scores - Set one event score.
pub async fn update_score(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateScoreRequest>,
) -> ApiResult<Unit> {
    if request.event_name.trim().is_empty() {
        return Err(AppError::Validation("Event name is required".to_string()));
    }
    let score = request.parse_score()?;

    match state.festival.update_score(&id, &request.event_name, score).await {
        Ok(unit) => success(unit),
        Err(e) => {
            tracing::warn!("Error updating score for unit {}: {}", id, e);
            Err(e)
        }
    }
}
