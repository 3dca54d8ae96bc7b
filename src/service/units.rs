//! Unit operations.

use subtle::ConstantTimeEq;

use super::Festival;
use crate::errors::AppError;
use crate::models::{required, CreateUnitRequest, Unit, UnitRecord, UpdateUnitRequest};
use crate::scoring::{apply_score, reconcile_events};
use crate::store::collections;

impl Festival {
    /// All units, reconciled against the roster, in key order.
    pub async fn list_units(&self) -> Result<Vec<Unit>, AppError> {
        let roster = self.roster_names().await?;
        Ok(self
            .stored_units()
            .await?
            .into_iter()
            .map(|u| self.reconciled(u, &roster))
            .collect())
    }

    /// One unit, reconciled against the roster.
    pub async fn get_unit(&self, id: &str) -> Result<Unit, AppError> {
        let record = self
            .store
            .get_one(collections::UNITS, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unit {} not found", id)))?;
        let roster = self.roster_names().await?;
        Ok(self.reconciled(Unit::from_record(id, record)?, &roster))
    }

    /// Find the unit holding a login credential.
    pub async fn get_unit_by_credential(&self, credential_id: &str) -> Result<Unit, AppError> {
        let credential = required(credential_id, "Credential ID")?;

        let found = self
            .stored_units()
            .await?
            .into_iter()
            .find(|u| credential_matches(&u.credential_id, &credential));

        match found {
            Some(unit) => {
                let roster = self.roster_names().await?;
                tracing::info!(unit_id = %unit.id, "Unit signed in");
                Ok(self.reconciled(unit, &roster))
            }
            None => Err(AppError::Unauthorized("Invalid credential ID".to_string())),
        }
    }

    /// Register a unit with a zero score for every event on the roster.
    pub async fn add_unit(&self, request: &CreateUnitRequest) -> Result<Unit, AppError> {
        let name = required(&request.name, "Unit name")?;
        let theme = request
            .theme
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let credential_id = match request.credential_id.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => uuid::Uuid::new_v4().simple().to_string(),
        };

        self.ensure_credential_free(&credential_id, None).await?;

        let roster = self.roster_names().await?;
        let record = UnitRecord {
            name,
            theme,
            events: Some(reconcile_events(&[], &roster, self.orphan_policy)),
            photo_access_count: 0,
            credential_id,
        };

        let id = self
            .store
            .push(collections::UNITS, record.to_value()?)
            .await?;
        tracing::info!(unit_id = %id, unit = %record.name, "Unit registered");

        Unit::from_record(&id, record.to_value()?)
    }

    /// Edit a unit's name, theme or credential. Scores are left alone.
    pub async fn update_unit(&self, id: &str, request: &UpdateUnitRequest) -> Result<Unit, AppError> {
        let name = request
            .name
            .as_deref()
            .map(|n| required(n, "Unit name"))
            .transpose()?;
        let credential_id = request
            .credential_id
            .as_deref()
            .map(|c| required(c, "Credential ID"))
            .transpose()?;
        let theme = request.theme.as_deref().map(str::trim).map(str::to_string);

        if let Some(credential) = &credential_id {
            self.ensure_credential_free(credential, Some(id)).await?;
        }

        let committed = self
            .store
            .transact(collections::UNITS, id, &|current| {
                let Some(current) = current else {
                    return Ok(None);
                };
                let mut record = UnitRecord::from_value(current)?;
                if let Some(name) = &name {
                    record.name = name.clone();
                }
                if let Some(theme) = &theme {
                    record.theme = Some(theme.clone()).filter(|t| !t.is_empty());
                }
                if let Some(credential) = &credential_id {
                    record.credential_id = credential.clone();
                }
                Ok(Some(record.to_value()?))
            })
            .await?;

        if committed.is_none() {
            return Err(AppError::NotFound(format!("Unit {} not found", id)));
        }
        self.get_unit(id).await
    }

    /// Delete a unit.
    pub async fn delete_unit(&self, id: &str) -> Result<(), AppError> {
        if !self.store.remove(collections::UNITS, id).await? {
            return Err(AppError::NotFound(format!("Unit {} not found", id)));
        }
        tracing::info!(unit_id = id, "Unit deleted");
        Ok(())
    }

    /// Set one event score as a single transaction over the whole unit record, so concurrent
    /// edits to the unit's other events survive.
    pub async fn update_score(&self, unit_id: &str, event_name: &str, score: i64) -> Result<Unit, AppError> {
        let event_name = required(event_name, "Event name")?;

        let committed = self
            .store
            .transact(collections::UNITS, unit_id, &|current| {
                let Some(current) = current else {
                    return Ok(None);
                };
                let mut record = UnitRecord::from_value(current)?;
                apply_score(record.events.get_or_insert_with(Vec::new), &event_name, score);
                Ok(Some(record.to_value()?))
            })
            .await?;

        let Some(committed) = committed else {
            return Err(AppError::NotFound(format!("Unit {} not found", unit_id)));
        };
        tracing::info!(unit_id, event = %event_name, score, "Score updated");

        let roster = self.roster_names().await?;
        Ok(self.reconciled(Unit::from_record(unit_id, committed)?, &roster))
    }

    /// Count one gallery view. Failures are logged, never raised.
    pub async fn increment_photo_access(&self, unit_id: &str) {
        let result = self
            .store
            .transact(collections::UNITS, unit_id, &|current| {
                let Some(current) = current else {
                    return Ok(None);
                };
                let mut record = UnitRecord::from_value(current)?;
                record.photo_access_count = record.photo_access_count.saturating_add(1);
                Ok(Some(record.to_value()?))
            })
            .await;

        if let Err(e) = result {
            tracing::warn!(unit_id, "Failed to increment photo access count: {}", e);
        }
    }

    /// Reject a credential already held by another unit.
    async fn ensure_credential_free(&self, credential: &str, owner: Option<&str>) -> Result<(), AppError> {
        let clash = self
            .stored_units()
            .await?
            .into_iter()
            .any(|u| u.credential_id == credential && Some(u.id.as_str()) != owner);
        if clash {
            return Err(AppError::Conflict {
                message: "Credential ID is already assigned to another unit".to_string(),
                attempts: 0,
            });
        }
        Ok(())
    }
}

/// Compare credentials without leaking how much of the prefix matched.
fn credential_matches(stored: &str, provided: &str) -> bool {
    !stored.is_empty() && bool::from(stored.as_bytes().ct_eq(provided.as_bytes()))
}
