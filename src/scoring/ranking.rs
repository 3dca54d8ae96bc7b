//! Scoreboard ordering.

use std::cmp::Ordering;

use serde::Serialize;

use super::total_score;
use crate::models::Unit;

/// Secondary ordering for units with equal totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Keep the order units were fetched in (stable sort).
    #[default]
    FetchOrder,
    /// Case-insensitive name, ascending.
    Name,
    /// Record id, ascending. Ids are time-ordered, so this is registration order.
    Id,
}

impl TieBreak {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fetch-order" | "fetch_order" | "none" => Some(TieBreak::FetchOrder),
            "name" => Some(TieBreak::Name),
            "id" | "registration" => Some(TieBreak::Id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::FetchOrder => "fetch-order",
            TieBreak::Name => "name",
            TieBreak::Id => "id",
        }
    }

    fn compare(&self, a: &Unit, b: &Unit) -> Ordering {
        match self {
            TieBreak::FetchOrder => Ordering::Equal,
            TieBreak::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id)),
            TieBreak::Id => a.id.cmp(&b.id),
        }
    }
}

/// A unit's place on the scoreboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// 1-based position; equal totals still get distinct ranks.
    pub rank: usize,
    pub total_score: i64,
    pub unit: Unit,
}

/// Order units by descending total score and number them from 1.
pub fn rank(units: Vec<Unit>, tie_break: TieBreak) -> Vec<Standing> {
    let mut scored: Vec<(i64, Unit)> = units.into_iter().map(|u| (total_score(&u), u)).collect();

    // sort_by is stable, which is what FetchOrder relies on.
    scored.sort_by(|(ta, a), (tb, b)| tb.cmp(ta).then_with(|| tie_break.compare(a, b)));

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (total_score, unit))| Standing {
            rank: i + 1,
            total_score,
            unit,
        })
        .collect()
}
