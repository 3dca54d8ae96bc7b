//! SQLite-backed record store.
//!
//! One `records` table holds every collection; the JSON body is stored as text next to its
//! version stamp. SQLite is the source of truth for all festival data.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use super::{RecordStore, Versioned};
use crate::errors::AppError;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Record store on a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    max_retries: u32,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, max_retries: u32) -> Self {
        Self { pool, max_retries }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_all(&self, collection: &str) -> Result<BTreeMap<String, Value>, AppError> {
        let rows = sqlx::query("SELECT id, body FROM records WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        let mut records = BTreeMap::new();
        for row in rows {
            let body: String = row.get("body");
            records.insert(row.get("id"), serde_json::from_str(&body)?);
        }
        Ok(records)
    }

    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Versioned>, AppError> {
        let row = sqlx::query("SELECT body, version FROM records WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(Versioned {
                    body: serde_json::from_str(&body)?,
                    version: row.get("version"),
                }))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, collection: &str, id: &str, record: Value) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"INSERT INTO records (collection, id, body, version, updated_at)
               VALUES (?, ?, ?, 1, ?)
               ON CONFLICT (collection, id)
               DO UPDATE SET body = excluded.body, version = records.version + 1, updated_at = excluded.updated_at"#,
        )
        .bind(collection)
        .bind(id)
        .bind(record.to_string())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn compare_and_set(
        &self,
        collection: &str,
        id: &str,
        expected: Option<i64>,
        record: &Value,
    ) -> Result<bool, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = match expected {
            Some(version) => {
                sqlx::query(
                    "UPDATE records SET body = ?, version = version + 1, updated_at = ? WHERE collection = ? AND id = ? AND version = ?",
                )
                .bind(record.to_string())
                .bind(&now)
                .bind(collection)
                .bind(id)
                .bind(version)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "INSERT INTO records (collection, id, body, version, updated_at) VALUES (?, ?, ?, 1, ?) ON CONFLICT (collection, id) DO NOTHING",
                )
                .bind(collection)
                .bind(id)
                .bind(record.to_string())
                .bind(&now)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
