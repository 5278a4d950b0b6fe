//! CRUD over individual task outcomes

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use tally_core::{TaskLookup, TaskMeta, TaskState};
use tally_storage::CoordinationStore;

use crate::error::BackendResult;

/// Stores and retrieves individual task results.
///
/// Writes are last-write-wins upserts; this layer enforces no state
/// transitions. Reads never report absence: an unknown identifier yields the
/// canonical PENDING default, because absence is ambiguous between "not
/// started" and "record purged".
#[derive(Clone)]
pub struct ResultStore {
    store: Arc<dyn CoordinationStore>,
}

impl ResultStore {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    /// Upsert the record for `task_id`, stamping the completion time
    pub async fn store_result(
        &self,
        task_id: &str,
        state: TaskState,
        result: Option<Vec<u8>>,
        traceback: Option<String>,
    ) -> BackendResult<()> {
        debug!(task_id, state = %state, "Storing task result");
        let meta = TaskMeta {
            task_id: task_id.to_string(),
            state,
            result,
            traceback,
            date_done: Some(Utc::now()),
        };
        self.store.upsert_task(&meta).await?;
        Ok(())
    }

    /// Read the record for `task_id`; a PENDING default if none is stored.
    ///
    /// Store failures are returned as errors, never folded into the default.
    pub async fn get_task_meta(&self, task_id: &str) -> BackendResult<TaskLookup> {
        match self.store.fetch_task(task_id).await? {
            Some(meta) => Ok(TaskLookup::Stored(meta)),
            None => Ok(TaskLookup::Pending(TaskMeta::pending(task_id))),
        }
    }

    /// Delete the record for `task_id`; deleting a missing record is not an
    /// error
    pub async fn forget(&self, task_id: &str) -> BackendResult<()> {
        let existed = self.store.delete_task(task_id).await?;
        debug!(task_id, existed, "Forgot task result");
        Ok(())
    }
}
