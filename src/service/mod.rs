//! Festival operations over an injected record store.
//!
//! Reads of units are always reconciled against the current roster, so display heals itself
//! when a fan-out write was interrupted.

mod events;
mod gallery;
mod scoreboard;
mod units;
mod venue;

pub use scoreboard::*;

use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{Event, Unit};
use crate::scoring::{reconcile_with, OrphanPolicy, TieBreak};
use crate::store::{collections, RecordStore};

/// Festival service. Cheap to clone; all state lives in the store.
#[derive(Clone)]
pub struct Festival {
    store: Arc<dyn RecordStore>,
    orphan_policy: OrphanPolicy,
    tie_break: TieBreak,
}

impl Festival {
    pub fn new(store: Arc<dyn RecordStore>, orphan_policy: OrphanPolicy, tie_break: TieBreak) -> Self {
        Self {
            store,
            orphan_policy,
            tie_break,
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Roster names in roster order.
    async fn roster_names(&self) -> Result<Vec<String>, AppError> {
        Ok(self
            .list_events()
            .await?
            .into_iter()
            .map(|e| e.name)
            .collect())
    }

    fn reconciled(&self, unit: Unit, roster: &[String]) -> Unit {
        reconcile_with(&unit, roster, self.orphan_policy)
    }

    /// Units as stored, in key order. Records that no longer decode are skipped.
    async fn stored_units(&self) -> Result<Vec<Unit>, AppError> {
        Ok(self
            .store
            .get_all(collections::UNITS)
            .await?
            .into_iter()
            .filter_map(|(id, record)| match Unit::from_record(&id, record) {
                Ok(unit) => Some(unit),
                Err(e) => {
                    tracing::warn!(unit_id = %id, "Skipping malformed unit record: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn stored_events(&self) -> Result<Vec<Event>, AppError> {
        self.store
            .get_all(collections::EVENTS)
            .await?
            .into_iter()
            .map(|(id, record)| Event::from_record(&id, record))
            .collect()
    }
}
