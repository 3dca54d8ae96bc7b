//! Unit self-service endpoints.

use axum::extract::{Path, State};

use super::{success, ApiJson, ApiResult};
use crate::models::{LoginRequest, UnitDashboard, UnitProfile};
use crate::AppState;

/// POST /api/login - Exchange a credential ID for the unit's profile.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<UnitProfile> {
    let unit = state
        .festival
        .get_unit_by_credential(&request.credential_id)
        .await?;
    success(unit.profile())
}

/// GET /api/dashboard/:unit_id - A unit's scores, rank and photos.
///
/// 404 tells the client its stored session points at a deleted unit.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> ApiResult<UnitDashboard> {
    success(state.festival.unit_dashboard(&unit_id).await?)
}
