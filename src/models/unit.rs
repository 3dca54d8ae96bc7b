//! Unit ("megala") models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EventScore, GalleryImage};
use crate::errors::AppError;

/// A competing group, as seen by administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub events: Vec<EventScore>,
    pub photo_access_count: u64,
    pub credential_id: String,
}

/// Stored shape of a unit. Every field tolerates absence in older records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventScore>>,
    #[serde(default)]
    pub photo_access_count: u64,
    #[serde(default)]
    pub credential_id: String,
}

impl UnitRecord {
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value, AppError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Unit {
    /// Build a unit from its stored record. A missing events list becomes empty;
    /// reconciliation fills it from the roster.
    pub fn from_record(id: &str, record: Value) -> Result<Self, AppError> {
        let record = UnitRecord::from_value(record)?;
        Ok(Self {
            id: id.to_string(),
            name: record.name,
            theme: record.theme,
            events: record.events.unwrap_or_default(),
            photo_access_count: record.photo_access_count,
            credential_id: record.credential_id,
        })
    }

    /// Public view without the login credential.
    pub fn profile(&self) -> UnitProfile {
        UnitProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            theme: self.theme.clone(),
            events: self.events.clone(),
            photo_access_count: self.photo_access_count,
        }
    }
}

/// What a unit (or the public) may see about a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitProfile {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub events: Vec<EventScore>,
    pub photo_access_count: u64,
}

/// Self-service dashboard payload for a signed-in unit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDashboard {
    pub unit: UnitProfile,
    pub rank: usize,
    pub total_score: i64,
    pub images: Vec<GalleryImage>,
}

/// Request body for registering a unit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUnitRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub theme: Option<String>,
    /// Login token; generated when omitted
    #[serde(default)]
    pub credential_id: Option<String>,
}

/// Request body for editing a unit's details. Scores are edited separately.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUnitRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub credential_id: Option<String>,
}

/// Request body for setting one event score.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScoreRequest {
    #[serde(default)]
    pub event_name: String,
    /// Integer, or a string holding one (form input)
    #[serde(default)]
    pub score: Value,
}

impl UpdateScoreRequest {
    pub fn parse_score(&self) -> Result<i64, AppError> {
        parse_score(&self.score)
    }
}

/// Interpret score input from a form or JSON body.
pub fn parse_score(value: &Value) -> Result<i64, AppError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::Validation(format!("Score must be a whole number, got {}", value)))
}

/// Request body for unit self-service sign-in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub credential_id: String,
}
