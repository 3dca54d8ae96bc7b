//! Admin dashboard endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::service::Overview;
use crate::AppState;

/// GET /api/admin/overview - Headline counts.
pub async fn get_overview(State(state): State<AppState>) -> ApiResult<Overview> {
    success(state.festival.overview().await?)
}
