//! The store capability contract the coordination engine relies on

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tally_core::{ChordMeta, GroupMeta, TaskMeta};

use crate::error::StoreResult;

/// Records removed by one sweep pass, per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub tasks: u64,
    pub groups: u64,
    pub chords: u64,
}

impl SweepReport {
    pub fn total(&self) -> u64 {
        self.tasks + self.groups + self.chords
    }
}

/// Capability contract required from the underlying store.
///
/// Three independent, partitioned collections keyed by their respective
/// identifiers; no cross-collection integrity is enforced here. Deletes
/// return whether a record existed, so they double as conditional removals.
///
/// The two operations the chord protocol's correctness rests on:
///
/// - [`incr_chord`](CoordinationStore::incr_chord) must be a single atomic
///   increment-and-return. Two children completing concurrently must observe
///   distinct post-increment values; a read-then-write implementation is
///   incorrect.
/// - [`claim_chord`](CoordinationStore::claim_chord) must be an atomic
///   delete-if-exists returning `true` to exactly one caller. It is the sole
///   arbiter of "has this chord already been finalized".
///
/// Implementations must never interpolate identifiers into query text.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Insert or overwrite a task result record (last-write-wins)
    async fn upsert_task(&self, meta: &TaskMeta) -> StoreResult<()>;

    /// Fetch a task result record, `None` if absent
    async fn fetch_task(&self, task_id: &str) -> StoreResult<Option<TaskMeta>>;

    /// Delete a task result record; `false` if it did not exist
    async fn delete_task(&self, task_id: &str) -> StoreResult<bool>;

    /// Insert or overwrite a group manifest as one atomic record
    async fn upsert_group(&self, group: &GroupMeta) -> StoreResult<()>;

    /// Fetch a group manifest, `None` if absent
    async fn fetch_group(&self, group_id: &str) -> StoreResult<Option<GroupMeta>>;

    /// Delete a group manifest; `false` if it did not exist
    async fn delete_group(&self, group_id: &str) -> StoreResult<bool>;

    /// Create (or overwrite) a chord counter record
    async fn init_chord(&self, chord: &ChordMeta) -> StoreResult<()>;

    /// Fetch a chord counter record, `None` if absent
    async fn fetch_chord(&self, chord_id: &str) -> StoreResult<Option<ChordMeta>>;

    /// Atomically increment the chord's completed count and return the
    /// post-increment value; `None` if the chord record is absent
    async fn incr_chord(&self, chord_id: &str) -> StoreResult<Option<i64>>;

    /// Atomically remove the chord record if it exists; `true` to exactly
    /// one caller per chord
    async fn claim_chord(&self, chord_id: &str) -> StoreResult<bool>;

    /// Delete every record older than `cutoff` across all three collections
    async fn sweep(&self, cutoff: DateTime<Utc>) -> StoreResult<SweepReport>;

    /// Release the underlying connection handle
    async fn close(&self) -> StoreResult<()>;
}
