//! Public scoreboard endpoint.

use std::collections::HashSet;

use axum::extract::State;
use serde::Deserialize;

use super::{success, ApiQuery, ApiResult};
use crate::service::ScoreboardEntry;
use crate::AppState;

/// Upper bound on name-search hits considered for the scoreboard.
const MAX_SEARCH_HITS: usize = 1000;

/// Scoreboard query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ScoreboardQuery {
    /// Optional unit-name search.
    #[serde(default)]
    pub q: Option<String>,
}

/// GET /api/scoreboard - Ranked units, optionally narrowed by a name search.
pub async fn get_scoreboard(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ScoreboardQuery>,
) -> ApiResult<Vec<ScoreboardEntry>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return success(state.festival.scoreboard(None).await?);
    }

    let hits: HashSet<String> = state
        .search
        .search(query, MAX_SEARCH_HITS)?
        .into_iter()
        .collect();

    success(state.festival.scoreboard(Some(&hits)).await?)
}
