//! Gallery image model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// A photo shown in the public gallery, optionally attributed to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: String,
    /// URL or data URL of the image
    pub src: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    pub ai_hint: String,
    /// Object storage path, when the image lives in the bucket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GalleryImageRecord {
    #[serde(default)]
    src: String,
    #[serde(default)]
    alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit_id: Option<String>,
    #[serde(default)]
    ai_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_path: Option<String>,
}

impl GalleryImage {
    pub fn from_record(id: &str, record: Value) -> Result<Self, AppError> {
        let record: GalleryImageRecord = serde_json::from_value(record)?;
        Ok(Self {
            id: id.to_string(),
            src: record.src,
            alt: record.alt,
            unit_id: record.unit_id.filter(|u| !u.is_empty()),
            ai_hint: record.ai_hint,
            storage_path: record.storage_path,
        })
    }

    /// Stored body, without the id.
    pub fn to_record(&self) -> Result<Value, AppError> {
        let record = GalleryImageRecord {
            src: self.src.clone(),
            alt: self.alt.clone(),
            unit_id: self.unit_id.clone(),
            ai_hint: self.ai_hint.clone(),
            storage_path: self.storage_path.clone(),
        };
        Ok(serde_json::to_value(record)?)
    }
}

/// Request body for adding a gallery image.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGalleryImageRequest {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub ai_hint: String,
    #[serde(default)]
    pub storage_path: Option<String>,
}

/// Query parameters for listing gallery images.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryQuery {
    #[serde(default)]
    pub unit_id: Option<String>,
}
