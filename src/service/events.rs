//! Event roster operations and their fan-out over units.

use super::Festival;
use crate::errors::AppError;
use crate::models::{required, Event, EventScore, UnitRecord};
use crate::store::collections;

impl Festival {
    /// The roster, in creation order.
    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        self.stored_events().await
    }

    /// Add an event to the roster, then give every unit a zero score for it.
    ///
    /// The roster insert is not rolled back if a unit update fails; reconciliation on read
    /// fills the gap. The first per-unit error is returned once every unit was attempted.
    pub async fn add_event(&self, name: &str) -> Result<Event, AppError> {
        let name = required(name, "Event name")?;

        let id = self
            .store
            .push(collections::EVENTS, Event::record(&name))
            .await?;
        tracing::info!(event_id = %id, event = %name, "Event added to roster");

        let units = self.stored_units().await?;
        let mut first_error = None;

        for unit in &units {
            let result = self
                .store
                .transact(collections::UNITS, &unit.id, &|current| {
                    let Some(current) = current else {
                        return Ok(None);
                    };
                    let mut record = UnitRecord::from_value(current)?;
                    let events = record.events.get_or_insert_with(Vec::new);
                    if !events.iter().any(|e| e.name == name) {
                        events.push(EventScore::new(name.as_str(), 0));
                    }
                    Ok(Some(record.to_value()?))
                })
                .await;

            if let Err(e) = result {
                tracing::warn!(unit_id = %unit.id, event = %name, "Failed to add event to unit: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(Event { id, name }),
        }
    }

    /// Remove an event from the roster and strip its scores from every unit.
    ///
    /// The name comes from the roster record. A caller-supplied name must agree with it and is
    /// only relied on once the record is already gone, so a retried delete still cleans up.
    pub async fn delete_event(&self, event_id: &str, name: Option<&str>) -> Result<(), AppError> {
        let supplied = name.map(str::trim).filter(|n| !n.is_empty());

        let name = match self.store.get_one(collections::EVENTS, event_id).await? {
            Some(record) => {
                let stored = Event::from_record(event_id, record)?.name;
                if let Some(supplied) = supplied.filter(|s| *s != stored) {
                    return Err(AppError::Validation(format!(
                        "Event {} is named {:?}, not {:?}",
                        event_id, stored, supplied
                    )));
                }
                self.store.remove(collections::EVENTS, event_id).await?;
                stored
            }
            None => match supplied {
                Some(supplied) => {
                    tracing::debug!(event_id, "Event already absent from roster");
                    supplied.to_string()
                }
                None => return Err(AppError::NotFound(format!("Event {} not found", event_id))),
            },
        };
        tracing::info!(event_id, event = %name, "Event removed from roster");

        // Another roster entry with the same name still owns those scores.
        if self.roster_names().await?.contains(&name) {
            return Ok(());
        }

        let units = self.stored_units().await?;
        let mut first_error = None;

        for unit in &units {
            if !unit.events.iter().any(|e| e.name == name) {
                continue;
            }

            let result = self
                .store
                .transact(collections::UNITS, &unit.id, &|current| {
                    let Some(current) = current else {
                        return Ok(None);
                    };
                    let mut record = UnitRecord::from_value(current)?;
                    if let Some(events) = record.events.as_mut() {
                        events.retain(|e| e.name != name);
                    }
                    Ok(Some(record.to_value()?))
                })
                .await;

            if let Err(e) = result {
                tracing::warn!(unit_id = %unit.id, event = %name, "Failed to remove event from unit: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
