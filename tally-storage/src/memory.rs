//! In-memory store implementation
//!
//! Backs tests and single-process development runs. Every operation takes the
//! one write lock for its full duration, which makes the increment and the
//! claim atomic with respect to each other, the same guarantee a real store
//! provides through its native primitives.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use tally_core::{ChordMeta, GroupMeta, TaskMeta};

use crate::error::StoreResult;
use crate::store::{CoordinationStore, SweepReport};

#[derive(Default)]
struct State {
    tasks: HashMap<String, TaskMeta>,
    groups: HashMap<String, GroupMeta>,
    chords: HashMap<String, ChordMeta>,
}

/// In-memory [`CoordinationStore`]
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all collections (test helper)
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state.tasks.len() + state.groups.len() + state.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CoordinationStore for InMemoryStore {
    async fn upsert_task(&self, meta: &TaskMeta) -> StoreResult<()> {
        // An unset completion timestamp is stamped at write time, so every
        // stored record is eligible for sweeping
        let mut meta = meta.clone();
        meta.date_done.get_or_insert_with(Utc::now);
        self.state
            .write()
            .tasks
            .insert(meta.task_id.clone(), meta);
        Ok(())
    }

    async fn fetch_task(&self, task_id: &str) -> StoreResult<Option<TaskMeta>> {
        Ok(self.state.read().tasks.get(task_id).cloned())
    }

    async fn delete_task(&self, task_id: &str) -> StoreResult<bool> {
        Ok(self.state.write().tasks.remove(task_id).is_some())
    }

    async fn upsert_group(&self, group: &GroupMeta) -> StoreResult<()> {
        self.state
            .write()
            .groups
            .insert(group.group_id.clone(), group.clone());
        Ok(())
    }

    async fn fetch_group(&self, group_id: &str) -> StoreResult<Option<GroupMeta>> {
        Ok(self.state.read().groups.get(group_id).cloned())
    }

    async fn delete_group(&self, group_id: &str) -> StoreResult<bool> {
        Ok(self.state.write().groups.remove(group_id).is_some())
    }

    async fn init_chord(&self, chord: &ChordMeta) -> StoreResult<()> {
        self.state
            .write()
            .chords
            .insert(chord.chord_id.clone(), chord.clone());
        Ok(())
    }

    async fn fetch_chord(&self, chord_id: &str) -> StoreResult<Option<ChordMeta>> {
        Ok(self.state.read().chords.get(chord_id).cloned())
    }

    async fn incr_chord(&self, chord_id: &str) -> StoreResult<Option<i64>> {
        let mut state = self.state.write();
        Ok(state.chords.get_mut(chord_id).map(|chord| {
            chord.completed += 1;
            chord.completed
        }))
    }

    async fn claim_chord(&self, chord_id: &str) -> StoreResult<bool> {
        Ok(self.state.write().chords.remove(chord_id).is_some())
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) -> StoreResult<SweepReport> {
        let mut state = self.state.write();
        let mut report = SweepReport::default();

        let before = state.tasks.len();
        state
            .tasks
            .retain(|_, meta| !matches!(meta.date_done, Some(done) if done < cutoff));
        report.tasks = (before - state.tasks.len()) as u64;

        let before = state.groups.len();
        state.groups.retain(|_, group| group.created_at >= cutoff);
        report.groups = (before - state.groups.len()) as u64;

        let before = state.chords.len();
        state.chords.retain(|_, chord| chord.created_at >= cutoff);
        report.chords = (before - state.chords.len()) as u64;

        Ok(report)
    }

    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
