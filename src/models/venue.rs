//! Venue announcement model.
//!
//! Entries form a history; the most recently added or edited one is the current venue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// Where something is happening: an item shown in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueDetails {
    pub id: String,
    pub room_number: String,
    pub item: String,
    /// When the entry was last added or edited. Absent on legacy records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Stored shape of a venue entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VenueRecord {
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl VenueRecord {
    pub fn to_value(&self) -> Result<Value, AppError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn into_details(self, id: &str) -> VenueDetails {
        VenueDetails {
            id: id.to_string(),
            room_number: self.room_number,
            item: self.item,
            timestamp: self.timestamp,
        }
    }
}

impl VenueDetails {
    pub fn from_record(id: &str, record: Value) -> Result<Self, AppError> {
        let record: VenueRecord = serde_json::from_value(record)?;
        Ok(record.into_details(id))
    }
}

/// Request body for adding or replacing a venue announcement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueRequest {
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub item: String,
}

impl VenueRequest {
    /// Both fields are required. Returns the trimmed record stamped with `now`.
    pub(crate) fn stamped(&self, now: DateTime<Utc>) -> Result<VenueRecord, AppError> {
        let room_number = self.room_number.trim();
        let item = self.item.trim();
        if room_number.is_empty() || item.is_empty() {
            return Err(AppError::Validation(
                "Venue details must include a room number and an item".to_string(),
            ));
        }
        Ok(VenueRecord {
            room_number: room_number.to_string(),
            item: item.to_string(),
            timestamp: Some(now),
        })
    }
}
