//! Venue announcements.

use chrono::Utc;

use super::Festival;
use crate::errors::AppError;
use crate::models::{VenueDetails, VenueRequest};
use crate::store::collections;

impl Festival {
    /// Venue history, newest first. Entries without a timestamp sort last.
    pub async fn list_venue(&self) -> Result<Vec<VenueDetails>, AppError> {
        let mut entries = self
            .store
            .get_all(collections::VENUE)
            .await?
            .into_iter()
            .rev()
            .map(|(id, record)| VenueDetails::from_record(&id, record))
            .collect::<Result<Vec<_>, _>>()?;

        // Stable over reversed key order, so equal stamps fall back to newest key first.
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// The venue shown to visitors: the most recently added or edited entry.
    pub async fn current_venue(&self) -> Result<VenueDetails, AppError> {
        self.list_venue()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("No venue has been announced yet".to_string()))
    }

    pub async fn add_venue(&self, request: &VenueRequest) -> Result<VenueDetails, AppError> {
        let record = request.stamped(Utc::now())?;
        let id = self
            .store
            .push(collections::VENUE, record.to_value()?)
            .await?;
        tracing::info!(venue_id = %id, room = %record.room_number, "Venue entry added");
        Ok(record.into_details(&id))
    }

    /// Replace an entry. The edit makes it the current venue.
    pub async fn update_venue(&self, id: &str, request: &VenueRequest) -> Result<VenueDetails, AppError> {
        let record = request.stamped(Utc::now())?;
        let body = record.to_value()?;

        let committed = self
            .store
            .transact(collections::VENUE, id, &|current| Ok(current.map(|_| body.clone())))
            .await?;
        if committed.is_none() {
            return Err(AppError::NotFound(format!("Venue entry {} not found", id)));
        }

        Ok(record.into_details(id))
    }

    pub async fn delete_venue(&self, id: &str) -> Result<(), AppError> {
        if !self.store.remove(collections::VENUE, id).await? {
            return Err(AppError::NotFound(format!("Venue entry {} not found", id)));
        }
        Ok(())
    }
}
