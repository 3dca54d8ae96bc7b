//! Score reconciliation.
//!
//! Keeps each unit's per-event score list aligned with the event roster. Everything here is
//! pure: the service layer decides when a reconciled view is persisted.

mod ranking;

pub use ranking::*;

use std::collections::{HashMap, HashSet};

use crate::models::{EventScore, Unit};

/// Treatment of score entries whose event is no longer on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Orphaned entries disappear from the reconciled view.
    #[default]
    Drop,
    /// Orphaned entries are kept after the roster entries, in their stored order.
    Retain,
}

impl OrphanPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Some(OrphanPolicy::Drop),
            "retain" | "keep" => Some(OrphanPolicy::Retain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrphanPolicy::Drop => "drop",
            OrphanPolicy::Retain => "retain",
        }
    }
}

/// Reconcile a unit against the roster, dropping orphaned entries.
///
/// The result holds exactly one entry per roster name, in roster order. Existing scores are
/// kept; missing entries start at zero.
pub fn reconcile<S: AsRef<str>>(unit: &Unit, roster: &[S]) -> Unit {
    reconcile_with(unit, roster, OrphanPolicy::Drop)
}

/// Reconcile a unit against the roster under an explicit orphan policy.
pub fn reconcile_with<S: AsRef<str>>(unit: &Unit, roster: &[S], policy: OrphanPolicy) -> Unit {
    Unit {
        events: reconcile_events(&unit.events, roster, policy),
        ..unit.clone()
    }
}

/// Derive the display list for one unit's stored scores.
///
/// When the stored list repeats a name, the first entry wins.
pub fn reconcile_events<S: AsRef<str>>(
    events: &[EventScore],
    roster: &[S],
    policy: OrphanPolicy,
) -> Vec<EventScore> {
    let mut stored: HashMap<&str, i64> = HashMap::with_capacity(events.len());
    for entry in events {
        stored.entry(entry.name.as_str()).or_insert(entry.score);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(roster.len());
    let mut reconciled = Vec::with_capacity(roster.len());

    for name in roster {
        let name = name.as_ref();
        // Event names are not unique on the roster itself.
        if !seen.insert(name) {
            continue;
        }
        let score = stored.get(name).copied().unwrap_or(0);
        reconciled.push(EventScore::new(name, score));
    }

    if policy == OrphanPolicy::Retain {
        for entry in events {
            if seen.insert(entry.name.as_str()) {
                reconciled.push(entry.clone());
            }
        }
    }

    reconciled
}

/// Set `name` to `score`, appending the entry when the unit has none for it.
pub fn apply_score(events: &mut Vec<EventScore>, name: &str, score: i64) {
    match events.iter_mut().find(|e| e.name == name) {
        Some(entry) => entry.score = score,
        None => events.push(EventScore::new(name, score)),
    }
}

/// Sum of all event scores. Saturates instead of overflowing.
pub fn total_score(unit: &Unit) -> i64 {
    total_of(&unit.events)
}

pub(crate) fn total_of(events: &[EventScore]) -> i64 {
    events.iter().fold(0i64, |acc, e| acc.saturating_add(e.score))
}
