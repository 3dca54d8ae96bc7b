//! Read models: public scoreboard, unit dashboard, admin overview.

use std::collections::HashSet;

use serde::Serialize;

use super::Festival;
use crate::errors::AppError;
use crate::models::{EventScore, UnitDashboard};
use crate::scoring::{rank, Standing};

/// One scoreboard row. Carries no credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardEntry {
    pub rank: usize,
    pub unit_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub events: Vec<EventScore>,
    pub total_score: i64,
}

impl From<Standing> for ScoreboardEntry {
    fn from(standing: Standing) -> Self {
        Self {
            rank: standing.rank,
            unit_id: standing.unit.id,
            name: standing.unit.name,
            theme: standing.unit.theme,
            events: standing.unit.events,
            total_score: standing.total_score,
        }
    }
}

/// The scoreboard leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUnit {
    pub unit_id: String,
    pub name: String,
    pub total_score: i64,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_units: usize,
    pub total_events: usize,
    pub total_images: usize,
    pub total_photo_accesses: u64,
    /// `None` until a unit is registered
    pub top_unit: Option<TopUnit>,
}

impl Festival {
    /// Reconciled units in scoreboard order.
    pub async fn standings(&self) -> Result<Vec<Standing>, AppError> {
        Ok(rank(self.list_units().await?, self.tie_break))
    }

    /// The public scoreboard. `only` narrows the rows without renumbering them.
    pub async fn scoreboard(
        &self,
        only: Option<&HashSet<String>>,
    ) -> Result<Vec<ScoreboardEntry>, AppError> {
        Ok(self
            .standings()
            .await?
            .into_iter()
            .filter(|s| only.map_or(true, |ids| ids.contains(&s.unit.id)))
            .map(ScoreboardEntry::from)
            .collect())
    }

    /// Everything a signed-in unit sees. Viewing it counts as a gallery view.
    ///
    /// Not-found means the unit was deleted since sign-in and the session is stale.
    pub async fn unit_dashboard(&self, unit_id: &str) -> Result<UnitDashboard, AppError> {
        self.increment_photo_access(unit_id).await;

        let standing = self
            .standings()
            .await?
            .into_iter()
            .find(|s| s.unit.id == unit_id)
            .ok_or_else(|| AppError::NotFound(format!("Unit {} not found", unit_id)))?;
        let images = self.list_gallery(Some(unit_id)).await?;

        Ok(UnitDashboard {
            unit: standing.unit.profile(),
            rank: standing.rank,
            total_score: standing.total_score,
            images,
        })
    }

    pub async fn overview(&self) -> Result<Overview, AppError> {
        let standings = self.standings().await?;
        let top_unit = standings.first().map(|leader| TopUnit {
            unit_id: leader.unit.id.clone(),
            name: leader.unit.name.clone(),
            total_score: leader.total_score,
        });

        Ok(Overview {
            total_units: standings.len(),
            total_events: self.stored_events().await?.len(),
            total_images: self.list_gallery(None).await?.len(),
            total_photo_accesses: standings
                .iter()
                .fold(0u64, |acc, s| acc.saturating_add(s.unit.photo_access_count)),
            top_unit,
        })
    }
}
