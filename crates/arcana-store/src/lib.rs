//! Arcana Store -- reading persistence and retention enforcement
//!
//! One Postgres table per engine (`engine_<name>_readings`), primary key
//! `id` (the reading id), secondary index on `(user_id, created_at DESC)`.
//! Rows are soft-expired at `expires_at`; reads respect expiry, an external
//! reaper purges. Retention is computed at write time and capped per
//! privacy category -- biometric readings never outlive 30 days.

pub mod retention;

use arcana_core::{EngineError, PrivacyLevel, StoredReading};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub use retention::RetentionPolicy;

/// One persisted reading row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub engine_name: String,
    pub payload_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub privacy_level: PrivacyLevel,
}

impl ReadingRecord {
    /// Build a row from an assembled reading.
    pub fn from_reading(reading: &StoredReading) -> Result<Self, EngineError> {
        Ok(Self {
            id: reading.reading_id.clone(),
            user_id: reading.user_id.clone(),
            engine_name: reading.output.engine_name.clone(),
            payload_json: serde_json::to_value(reading)
                .map_err(|e| EngineError::StorageError(format!("serialise reading: {}", e)))?,
            created_at: reading.created_at,
            updated_at: reading.updated_at,
            expires_at: reading.expires_at,
            privacy_level: reading.privacy_level,
        })
    }
}

/// Engine names become table identifiers, so they are restricted to
/// lowercase ASCII, digits and underscores.
fn validate_engine_name(engine_name: &str) -> Result<(), EngineError> {
    let ok = !engine_name.is_empty()
        && engine_name.chars().next().unwrap().is_ascii_lowercase()
        && engine_name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(EngineError::StorageError(format!(
            "'{}' is not a valid engine table name",
            engine_name
        )))
    }
}

/// Postgres-backed reading store.
pub struct ReadingStore {
    pool: PgPool,
    policy: RetentionPolicy,
    ensured_tables: Mutex<HashSet<String>>,
}

impl ReadingStore {
    /// Connect to the database.
    pub async fn connect(database_url: &str, policy: RetentionPolicy) -> Result<Self, EngineError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| EngineError::DependencyUnavailable(format!("database: {}", e)))?;
        info!("Reading store connected");
        Ok(Self {
            pool,
            policy,
            ensured_tables: Mutex::new(HashSet::new()),
        })
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Create the per-engine table and index once per process lifetime.
    async fn ensure_table(&self, engine_name: &str) -> Result<String, EngineError> {
        validate_engine_name(engine_name)?;
        let table = StoredReading::table_name(engine_name);

        let mut ensured = self.ensured_tables.lock().await;
        if ensured.contains(&table) {
            return Ok(table);
        }

        let create = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                engine_name TEXT NOT NULL,
                payload_json JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                expires_at TIMESTAMPTZ,
                privacy_level TEXT NOT NULL
            )"
        );
        let index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_user_created
             ON {table} (user_id, created_at DESC)"
        );

        sqlx::query(&create)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::StorageError(format!("create {}: {}", table, e)))?;
        sqlx::query(&index)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::StorageError(format!("index {}: {}", table, e)))?;

        ensured.insert(table.clone());
        Ok(table)
    }

    /// Persist a reading into its engine's table.
    pub async fn insert(&self, record: &ReadingRecord) -> Result<(), EngineError> {
        let table = self.ensure_table(&record.engine_name).await?;

        let privacy = serde_json::to_value(record.privacy_level)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "standard".into());

        let sql = format!(
            "INSERT INTO {table}
                (id, user_id, engine_name, payload_json, created_at, updated_at, expires_at, privacy_level)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO NOTHING"
        );
        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.user_id)
            .bind(&record.engine_name)
            .bind(&record.payload_json)
            .bind(record.created_at)
            .bind(record.updated_at)
            .bind(record.expires_at)
            .bind(privacy)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::StorageError(format!("insert into {}: {}", table, e)))?;
        Ok(())
    }

    /// Fetch a reading by id, honouring soft expiry.
    pub async fn fetch(
        &self,
        engine_name: &str,
        reading_id: &str,
    ) -> Result<Option<serde_json::Value>, EngineError> {
        let table = self.ensure_table(engine_name).await?;
        let sql = format!(
            "SELECT payload_json FROM {table}
             WHERE id = $1 AND (expires_at IS NULL OR expires_at > NOW())"
        );
        let row = sqlx::query(&sql)
            .bind(reading_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EngineError::StorageError(format!("fetch from {}: {}", table, e)))?;
        Ok(row.map(|r| r.get::<serde_json::Value, _>("payload_json")))
    }

    /// Most recent readings for a user, newest first.
    pub async fn list_for_user(
        &self,
        engine_name: &str,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<serde_json::Value>, EngineError> {
        let table = self.ensure_table(engine_name).await?;
        let sql = format!(
            "SELECT payload_json FROM {table}
             WHERE user_id = $1 AND (expires_at IS NULL OR expires_at > NOW())
             ORDER BY created_at DESC LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EngineError::StorageError(format!("list from {}: {}", table, e)))?;
        Ok(rows
            .into_iter()
            .map(|r| r.get::<serde_json::Value, _>("payload_json"))
            .collect())
    }

    /// Best-effort insert used from the write-behind path: failures are
    /// logged and swallowed.
    pub async fn insert_silent(&self, record: &ReadingRecord) {
        if let Err(e) = self.insert(record).await {
            warn!(
                engine = %record.engine_name,
                reading_id = %record.id,
                error = %e,
                "Reading persistence failed; dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_name_validation() {
        assert!(validate_engine_name("numerology").is_ok());
        assert!(validate_engine_name("human_design").is_ok());
        assert!(validate_engine_name("vedicclock_tcm").is_ok());
        assert!(validate_engine_name("").is_err());
        assert!(validate_engine_name("Tarot").is_err());
        assert!(validate_engine_name("tarot; DROP TABLE users").is_err());
        assert!(validate_engine_name("1numerology").is_err());
    }

    #[test]
    fn table_name_shape() {
        assert_eq!(StoredReading::table_name("tarot"), "engine_tarot_readings");
    }
}
