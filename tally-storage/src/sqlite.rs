//! SQLite store implementation
//!
//! Persists the three collections in their own tables and maps the two
//! coordination primitives onto single SQL statements: the increment is one
//! `UPDATE ... RETURNING` and the claim is one conditional `DELETE`, so both
//! are atomic at the store level regardless of how many worker processes
//! share the database. All queries are parameterized; identifiers are never
//! interpolated into SQL text.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use tally_core::{ChordMeta, GroupMeta, TaskMeta, TaskState};

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::{CoordinationStore, SweepReport};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS task_results (
        task_id   TEXT PRIMARY KEY,
        state     TEXT NOT NULL,
        result    BLOB,
        traceback TEXT,
        date_done INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS group_manifests (
        group_id   TEXT PRIMARY KEY,
        children   TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chord_meta (
        chord_id   TEXT PRIMARY KEY,
        size       INTEGER NOT NULL,
        completed  INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )",
];

/// SQLite-backed [`CoordinationStore`].
///
/// The pool is the backend instance's connection handle: established
/// explicitly here, shared by clone, and released by
/// [`close`](CoordinationStore::close). There is no process-wide singleton.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to the configured database and apply the schema
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        info!("Connecting to database: {}", config.url);

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::Configuration(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Open a private in-memory database (tests, throwaway runs).
    ///
    /// Limited to one connection: each `:memory:` connection is its own
    /// database, so a wider pool would see three empty tables per connection.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        }
        debug!("Schema applied ({} tables)", SCHEMA.len());
        Ok(())
    }
}

fn decode_timestamp(millis: i64, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::QueryFailed(format!("invalid {} timestamp: {}", column, millis)))
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    task_id: String,
    state: String,
    result: Option<Vec<u8>>,
    traceback: Option<String>,
    date_done: i64,
}

impl TaskRow {
    fn into_meta(self) -> StoreResult<TaskMeta> {
        let state = TaskState::from_str(&self.state).map_err(StoreError::QueryFailed)?;
        Ok(TaskMeta {
            task_id: self.task_id,
            state,
            result: self.result,
            traceback: self.traceback,
            date_done: Some(decode_timestamp(self.date_done, "date_done")?),
        })
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    group_id: String,
    children: String,
    created_at: i64,
}

impl GroupRow {
    fn into_meta(self) -> StoreResult<GroupMeta> {
        Ok(GroupMeta {
            group_id: self.group_id,
            children: serde_json::from_str(&self.children)?,
            created_at: decode_timestamp(self.created_at, "created_at")?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ChordRow {
    chord_id: String,
    size: i64,
    completed: i64,
    created_at: i64,
}

impl ChordRow {
    fn into_meta(self) -> StoreResult<ChordMeta> {
        Ok(ChordMeta {
            chord_id: self.chord_id,
            size: self.size,
            completed: self.completed,
            created_at: decode_timestamp(self.created_at, "created_at")?,
        })
    }
}

#[async_trait]
impl CoordinationStore for SqliteStore {
    async fn upsert_task(&self, meta: &TaskMeta) -> StoreResult<()> {
        let date_done = meta.date_done.unwrap_or_else(Utc::now);
        sqlx::query(
            "INSERT INTO task_results (task_id, state, result, traceback, date_done)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(task_id) DO UPDATE SET
                 state = excluded.state,
                 result = excluded.result,
                 traceback = excluded.traceback,
                 date_done = excluded.date_done",
        )
        .bind(&meta.task_id)
        .bind(meta.state.as_str())
        .bind(&meta.result)
        .bind(&meta.traceback)
        .bind(date_done.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_task(&self, task_id: &str) -> StoreResult<Option<TaskMeta>> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT task_id, state, result, traceback, date_done
             FROM task_results WHERE task_id = ?1",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TaskRow::into_meta).transpose()
    }

    async fn delete_task(&self, task_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM task_results WHERE task_id = ?1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_group(&self, group: &GroupMeta) -> StoreResult<()> {
        let children = serde_json::to_string(&group.children)?;
        sqlx::query(
            "INSERT INTO group_manifests (group_id, children, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(group_id) DO UPDATE SET
                 children = excluded.children,
                 created_at = excluded.created_at",
        )
        .bind(&group.group_id)
        .bind(children)
        .bind(group.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_group(&self, group_id: &str) -> StoreResult<Option<GroupMeta>> {
        let row: Option<GroupRow> = sqlx::query_as(
            "SELECT group_id, children, created_at FROM group_manifests WHERE group_id = ?1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(GroupRow::into_meta).transpose()
    }

    async fn delete_group(&self, group_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM group_manifests WHERE group_id = ?1")
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn init_chord(&self, chord: &ChordMeta) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO chord_meta (chord_id, size, completed, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(chord_id) DO UPDATE SET
                 size = excluded.size,
                 completed = excluded.completed,
                 created_at = excluded.created_at",
        )
        .bind(&chord.chord_id)
        .bind(chord.size)
        .bind(chord.completed)
        .bind(chord.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_chord(&self, chord_id: &str) -> StoreResult<Option<ChordMeta>> {
        let row: Option<ChordRow> = sqlx::query_as(
            "SELECT chord_id, size, completed, created_at FROM chord_meta WHERE chord_id = ?1",
        )
        .bind(chord_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ChordRow::into_meta).transpose()
    }

    async fn incr_chord(&self, chord_id: &str) -> StoreResult<Option<i64>> {
        // Single-statement increment-and-return: concurrent callers are
        // serialized by the database and each observes a distinct post-value.
        let completed: Option<i64> = sqlx::query_scalar(
            "UPDATE chord_meta SET completed = completed + 1
             WHERE chord_id = ?1
             RETURNING completed",
        )
        .bind(chord_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(completed)
    }

    async fn claim_chord(&self, chord_id: &str) -> StoreResult<bool> {
        // Conditional delete doubles as the one-time finalization claim
        let result = sqlx::query("DELETE FROM chord_meta WHERE chord_id = ?1")
            .bind(chord_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) -> StoreResult<SweepReport> {
        let cutoff = cutoff.timestamp_millis();

        let tasks = sqlx::query("DELETE FROM task_results WHERE date_done < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();
        let groups = sqlx::query("DELETE FROM group_manifests WHERE created_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();
        let chords = sqlx::query("DELETE FROM chord_meta WHERE created_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(SweepReport {
            tasks,
            groups,
            chords,
        })
    }

    async fn close(&self) -> StoreResult<()> {
        self.pool.close().await;
        Ok(())
    }
}
