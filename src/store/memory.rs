//! In-process record store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{RecordStore, Versioned};
use crate::config::DEFAULT_MAX_TX_RETRIES;
use crate::errors::AppError;

/// Record store held in memory. Same version semantics as [`super::SqliteStore`].
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Versioned>>>,
    max_retries: u32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TX_RETRIES)
    }
}

impl MemoryStore {
    pub fn new(max_retries: u32) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            max_retries,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_all(&self, collection: &str) -> Result<BTreeMap<String, Value>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .map(|(id, v)| (id.clone(), v.body.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Versioned>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn set(&self, collection: &str, id: &str, record: Value) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        let version = records.get(id).map(|v| v.version + 1).unwrap_or(1);
        records.insert(
            id.to_string(),
            Versioned {
                body: record,
                version,
            },
        );
        Ok(())
    }

    async fn compare_and_set(
        &self,
        collection: &str,
        id: &str,
        expected: Option<i64>,
        record: &Value,
    ) -> Result<bool, AppError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        let current = records.get(id).map(|v| v.version);
        if current != expected {
            return Ok(false);
        }
        records.insert(
            id.to_string(),
            Versioned {
                body: record.clone(),
                version: expected.map(|v| v + 1).unwrap_or(1),
            },
        );
        Ok(true)
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .and_then(|records| records.remove(id))
            .is_some())
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_push_and_get_all_in_key_order() {
        let store = MemoryStore::default();
        let first = store.push("events", json!({ "name": "A" })).await.unwrap();
        let second = store.push("events", json!({ "name": "B" })).await.unwrap();

        let all = store.get_all("events").await.unwrap();
        let keys: Vec<&String> = all.keys().collect();
        assert_eq!(keys, vec![&first, &second]);
        assert!(store.get_all("units").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compare_and_set_checks_version() {
        let store = MemoryStore::default();
        assert!(store
            .compare_and_set("units", "u1", None, &json!({ "n": 1 }))
            .await
            .unwrap());
        // Key now exists, so an insert-only write fails.
        assert!(!store
            .compare_and_set("units", "u1", None, &json!({ "n": 2 }))
            .await
            .unwrap());
        assert!(!store
            .compare_and_set("units", "u1", Some(7), &json!({ "n": 2 }))
            .await
            .unwrap());
        assert!(store
            .compare_and_set("units", "u1", Some(1), &json!({ "n": 2 }))
            .await
            .unwrap());

        let current = store.get_versioned("units", "u1").await.unwrap().unwrap();
        assert_eq!(current.version, 2);
        assert_eq!(current.body, json!({ "n": 2 }));
    }

    #[tokio::test]
    async fn test_remove_reports_existence() {
        let store = MemoryStore::default();
        store.set("venue", "v1", json!({})).await.unwrap();
        assert!(store.remove("venue", "v1").await.unwrap());
        assert!(!store.remove("venue", "v1").await.unwrap());
        assert!(store.get_one("venue", "v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transact_abort_writes_nothing() {
        let store = MemoryStore::default();
        let result = store
            .transact("units", "missing", &|current| Ok(current))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.get_one("units", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transact_counter() {
        let store = MemoryStore::default();
        for _ in 0..3 {
            store
                .transact("counters", "c", &|current| {
                    let n = current.and_then(|v| v.as_i64()).unwrap_or(0);
                    Ok(Some(json!(n + 1)))
                })
                .await
                .unwrap();
        }
        assert_eq!(store.get_one("counters", "c").await.unwrap(), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_transact_propagates_transform_error() {
        let store = MemoryStore::default();
        store.set("units", "u1", json!({})).await.unwrap();
        let err = store
            .transact("units", "u1", &|_| Err(AppError::Validation("nope".into())))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Validation("nope".into()));
    }
}
