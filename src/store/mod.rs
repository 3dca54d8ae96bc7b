//! Keyed record store.
//!
//! Records are JSON objects grouped into named collections and addressed by key. Every record
//! carries a version stamp; [`RecordStore::transact`] builds read-modify-write transactions on
//! top of the backend's compare-and-set.

#[cfg(test)]
mod memory;
mod sqlite;

#[cfg(test)]
pub use memory::*;
pub use sqlite::*;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AppError;

/// Collection names.
pub mod collections {
    pub const EVENTS: &str = "events";
    pub const UNITS: &str = "units";
    pub const GALLERY_IMAGES: &str = "galleryImages";
    pub const VENUE: &str = "venue";
}

/// A record body together with its version stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub body: Value,
    pub version: i64,
}

/// Pure transform applied inside a transaction.
///
/// Receives the current record (`None` when absent) and returns the record to commit, or
/// `None` to abort without writing. It may run several times, so it must not have side effects.
pub type Transform<'a> =
    &'a (dyn Fn(Option<Value>) -> Result<Option<Value>, AppError> + Send + Sync);

/// Generate a key for a pushed record. Keys sort in creation order.
pub fn new_key() -> String {
    uuid::Uuid::now_v7().to_string()
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of a collection, ordered by key.
    async fn get_all(&self, collection: &str) -> Result<BTreeMap<String, Value>, AppError>;

    /// One record with its version stamp.
    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Versioned>, AppError>;

    /// Write a record unconditionally.
    async fn set(&self, collection: &str, id: &str, record: Value) -> Result<(), AppError>;

    /// Write `record` only if the stored version still equals `expected`
    /// (`None`: only if the key is absent). Returns whether the write happened.
    async fn compare_and_set(
        &self,
        collection: &str,
        id: &str,
        expected: Option<i64>,
        record: &Value,
    ) -> Result<bool, AppError>;

    /// Delete a record. Returns whether it existed; deleting an absent key is not an error.
    async fn remove(&self, collection: &str, id: &str) -> Result<bool, AppError>;

    /// Bound on compare-and-set attempts per transaction.
    fn max_retries(&self) -> u32;

    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        Ok(self.get_versioned(collection, id).await?.map(|v| v.body))
    }

    /// Insert a record under a fresh key and return the key.
    async fn push(&self, collection: &str, record: Value) -> Result<String, AppError> {
        let id = new_key();
        self.set(collection, &id, record).await?;
        Ok(id)
    }

    /// Optimistic read-modify-write of one record.
    ///
    /// Re-reads and re-applies `transform` whenever another writer committed in between.
    /// Returns the committed record, or `None` if the transform aborted.
    async fn transact(
        &self,
        collection: &str,
        id: &str,
        transform: Transform<'_>,
    ) -> Result<Option<Value>, AppError> {
        let attempts = self.max_retries().max(1);

        for attempt in 1..=attempts {
            let current = self.get_versioned(collection, id).await?;
            let (body, version) = match current {
                Some(v) => (Some(v.body), Some(v.version)),
                None => (None, None),
            };

            let Some(next) = transform(body)? else {
                return Ok(None);
            };

            if self.compare_and_set(collection, id, version, &next).await? {
                return Ok(Some(next));
            }

            tracing::debug!(collection, id, attempt, "Transaction conflict, retrying");
        }

        tracing::warn!(collection, id, attempts, "Transaction gave up after repeated conflicts");
        Err(AppError::Conflict {
            message: format!("{}/{} kept changing; try again", collection, id),
            attempts,
        })
    }
}
