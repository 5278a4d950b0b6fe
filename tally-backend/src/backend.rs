//! The consumer-facing result backend facade

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
#[cfg(feature = "sqlite")]
use tracing::info;

use tally_core::{
    decode_payload, encode_payload, ChordMeta, ChordReadiness, JsonCodec, PayloadCodec,
    TaskLookup, TaskState,
};
use tally_storage::{BackendConfig, CoordinationStore, SweepReport};

#[cfg(feature = "sqlite")]
use tally_storage::SqliteStore;

use crate::chords::ChordCoordinator;
use crate::error::BackendResult;
use crate::groups::GroupCoordinator;
use crate::result_store::ResultStore;
use crate::sweeper::ExpirationSweeper;

/// One result-backend instance: the contract the dispatch engine talks to.
///
/// Owns its store handle explicitly: created by [`connect`](Self::connect)
/// or injected through [`with_store`](Self::with_store), released by
/// [`close`](Self::close). Cloning shares the handle.
#[derive(Clone)]
pub struct ResultBackend {
    store: Arc<dyn CoordinationStore>,
    codec: Arc<dyn PayloadCodec>,
    config: BackendConfig,
    results: ResultStore,
    groups: GroupCoordinator,
    chords: ChordCoordinator,
    sweeper: ExpirationSweeper,
}

impl ResultBackend {
    /// Connect to the configured database and build a backend over it
    #[cfg(feature = "sqlite")]
    pub async fn connect(config: BackendConfig) -> BackendResult<Self> {
        config.validate()?;
        let store = SqliteStore::connect(&config.database).await?;
        info!("Result backend ready: {}", config.database.url);
        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Build a backend over an already-established store handle
    pub fn with_store(store: Arc<dyn CoordinationStore>, config: BackendConfig) -> Self {
        Self {
            results: ResultStore::new(store.clone()),
            groups: GroupCoordinator::new(store.clone()),
            chords: ChordCoordinator::new(store.clone()),
            sweeper: ExpirationSweeper::new(store.clone()),
            codec: Arc::new(JsonCodec),
            store,
            config,
        }
    }

    /// Replace the payload codec
    pub fn with_codec(mut self, codec: Arc<dyn PayloadCodec>) -> Self {
        self.codec = codec;
        self
    }

    // --- task results -----------------------------------------------------

    /// Store a task outcome with an already-encoded payload
    pub async fn store_result(
        &self,
        task_id: &str,
        state: TaskState,
        result: Option<Vec<u8>>,
        traceback: Option<String>,
    ) -> BackendResult<()> {
        self.results
            .store_result(task_id, state, result, traceback)
            .await
    }

    /// Store a task outcome, encoding `value` through the backend's codec
    pub async fn store_result_value<T: Serialize>(
        &self,
        task_id: &str,
        state: TaskState,
        value: &T,
    ) -> BackendResult<()> {
        let payload = encode_payload(self.codec.as_ref(), value)?;
        self.results
            .store_result(task_id, state, Some(payload), None)
            .await
    }

    /// Read a task's record; a canonical PENDING default when unknown
    pub async fn get_task_meta(&self, task_id: &str) -> BackendResult<TaskLookup> {
        self.results.get_task_meta(task_id).await
    }

    /// Current state of a task (PENDING when unknown)
    pub async fn get_state(&self, task_id: &str) -> BackendResult<TaskState> {
        Ok(self.get_task_meta(task_id).await?.meta().state)
    }

    /// Decode a task's stored payload; `None` while no payload is stored
    pub async fn get_result<T: DeserializeOwned>(&self, task_id: &str) -> BackendResult<Option<T>> {
        let meta = self.get_task_meta(task_id).await?.into_meta();
        match meta.result {
            Some(bytes) => Ok(Some(decode_payload(self.codec.as_ref(), &bytes)?)),
            None => Ok(None),
        }
    }

    /// A failed task's stored traceback, if any
    pub async fn get_traceback(&self, task_id: &str) -> BackendResult<Option<String>> {
        Ok(self.get_task_meta(task_id).await?.into_meta().traceback)
    }

    /// Delete a task's record; idempotent
    pub async fn forget(&self, task_id: &str) -> BackendResult<()> {
        self.results.forget(task_id).await
    }

    // --- groups -----------------------------------------------------------

    pub async fn save_group(&self, group_id: &str, children: Vec<String>) -> BackendResult<()> {
        self.groups.save_group(group_id, children).await
    }

    pub async fn restore_group(&self, group_id: &str) -> BackendResult<Option<Vec<String>>> {
        self.groups.restore_group(group_id).await
    }

    pub async fn delete_group(&self, group_id: &str) -> BackendResult<()> {
        self.groups.delete_group(group_id).await
    }

    /// Materialize a group's child payloads in manifest order.
    ///
    /// `None` if the group is unknown. Each position holds the decoded
    /// payload of the corresponding child, or `None` while that child has no
    /// stored payload yet.
    pub async fn join_group(&self, group_id: &str) -> BackendResult<Option<Vec<Option<Value>>>> {
        let Some(children) = self.groups.restore_group(group_id).await? else {
            return Ok(None);
        };

        let mut values = Vec::with_capacity(children.len());
        for child in &children {
            let meta = self.results.get_task_meta(child).await?.into_meta();
            match meta.result {
                Some(bytes) => values.push(Some(self.codec.decode(&bytes)?)),
                None => values.push(None),
            }
        }
        Ok(Some(values))
    }

    // --- chords -----------------------------------------------------------

    pub async fn set_chord_size(&self, chord_id: &str, size: i64) -> BackendResult<()> {
        self.chords.set_chord_size(chord_id, size).await
    }

    pub async fn get_chord_meta(&self, chord_id: &str) -> BackendResult<Option<ChordMeta>> {
        self.chords.get_chord_meta(chord_id).await
    }

    /// Report one chord part's completion; `Ready` is returned to exactly
    /// one caller per chord
    pub async fn on_chord_part_return(
        &self,
        chord_id: &str,
        expected_size: i64,
    ) -> BackendResult<ChordReadiness> {
        self.chords.on_chord_part_return(chord_id, expected_size).await
    }

    pub async fn delete_chord(&self, chord_id: &str) -> BackendResult<()> {
        self.chords.delete_chord(chord_id).await
    }

    // --- maintenance ------------------------------------------------------

    /// Sweep records older than the configured `result_expires`
    pub async fn cleanup(&self) -> BackendResult<SweepReport> {
        self.sweeper.cleanup(self.config.result_expires).await
    }

    /// Sweep records older than an explicit time-to-live
    pub async fn cleanup_with_ttl(&self, ttl: Duration) -> BackendResult<SweepReport> {
        self.sweeper.cleanup(ttl).await
    }

    /// Release the store handle
    pub async fn close(&self) -> BackendResult<()> {
        self.store.close().await?;
        Ok(())
    }
}
