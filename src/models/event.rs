//! Event roster models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// A named scoring category on the global roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
}

/// Stored shape of an event (the id is the record key).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EventRecord {
    #[serde(default)]
    name: String,
}

impl Event {
    pub fn from_record(id: &str, record: Value) -> Result<Self, AppError> {
        let record: EventRecord = serde_json::from_value(record)?;
        Ok(Self {
            id: id.to_string(),
            name: record.name,
        })
    }

    /// Record body for a new roster entry.
    pub fn record(name: &str) -> Value {
        serde_json::json!({ "name": name })
    }
}

/// A unit's score in one named event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventScore {
    pub name: String,
    #[serde(default)]
    pub score: i64,
}

impl EventScore {
    pub fn new(name: impl Into<String>, score: i64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Request body for adding an event to the roster.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub name: String,
}

/// Query parameters accepted when deleting an event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteEventQuery {
    /// Name whose scores are removed from every unit; looked up from the roster when absent.
    #[serde(default)]
    pub name: Option<String>,
}
