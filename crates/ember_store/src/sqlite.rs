//! SQLite-backed state storage.
//!
//! One singleton row holds the entire emotional state as JSON; the
//! `CHECK (id = 1)` constraint makes "one record per deployment" a schema
//! fact rather than a convention. Saves are a single UPSERT, so a crash
//! mid-write leaves the previous good record in place — readers never see
//! a torn state.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

use ember_core::{InteractionEvent, PersistedState, PersistenceError, StateStore};

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    // WAL keeps writers from blocking the snapshot readers.
                    sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                    sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .connect(&db_url)
            .await
            .map_err(storage_err)?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS emotional_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                state_json TEXT NOT NULL,
                schema_version INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS interaction_log (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                magnitude REAL,
                at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_interaction_log_at ON interaction_log(at)")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }

    /// Number of audit entries, for dashboards and tests.
    pub async fn interaction_count(&self) -> Result<i64, PersistenceError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM interaction_log")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(row.get::<i64, _>("n"))
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn save_state(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(state)?;
        sqlx::query(
            r#"
            INSERT INTO emotional_state (id, state_json, schema_version, updated_at)
            VALUES (1, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                state_json = excluded.state_json,
                schema_version = excluded.schema_version,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&json)
        .bind(state.schema_version as i64)
        .bind(state.last_updated)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn load_state(&self) -> Result<Option<PersistedState>, PersistenceError> {
        let row = sqlx::query("SELECT state_json FROM emotional_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        match row {
            None => Ok(None),
            Some(row) => {
                let json: String = row.get("state_json");
                let record: PersistedState = serde_json::from_str(&json)?;
                Ok(Some(record))
            }
        }
    }

    async fn append_interaction(&self, event: &InteractionEvent) -> Result<(), PersistenceError> {
        sqlx::query("INSERT OR IGNORE INTO interaction_log (id, kind, magnitude, at) VALUES (?, ?, ?, ?)")
            .bind(event.id.to_string())
            .bind(event.kind.as_str())
            .bind(event.magnitude)
            .bind(event.timestamp)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }
}

fn storage_err(e: sqlx::Error) -> PersistenceError {
    PersistenceError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{EmotionalState, EventKind};

    async fn temp_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("test.db")).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_empty_load_returns_none() {
        let (store, _dir) = temp_store().await;
        assert!(store.load_state().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let (store, _dir) = temp_store().await;
        let state = EmotionalState::neutral(1234);
        store.save_state(&state.to_persisted()).await.unwrap();

        let loaded = store.load_state().await.unwrap().unwrap();
        assert_eq!(loaded.last_updated, 1234);
        let restored = EmotionalState::from_persisted(loaded).unwrap();
        assert_eq!(restored, state);
    }

    #[tokio::test]
    async fn test_save_is_singleton_upsert() {
        let (store, _dir) = temp_store().await;
        store.save_state(&EmotionalState::neutral(1).to_persisted()).await.unwrap();
        store.save_state(&EmotionalState::neutral(2).to_persisted()).await.unwrap();

        let loaded = store.load_state().await.unwrap().unwrap();
        assert_eq!(loaded.last_updated, 2);

        let row = sqlx::query("SELECT COUNT(*) AS n FROM emotional_state")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_an_error_not_a_panic() {
        let (store, _dir) = temp_store().await;
        sqlx::query(
            "INSERT INTO emotional_state (id, state_json, schema_version, updated_at) VALUES (1, 'not json', 0, 0)",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.load_state().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_interaction_log_appends() {
        let (store, _dir) = temp_store().await;
        for i in 0..3 {
            store
                .append_interaction(&InteractionEvent::new(EventKind::UserMessage, i))
                .await
                .unwrap();
        }
        assert_eq!(store.interaction_count().await.unwrap(), 3);
    }
}
