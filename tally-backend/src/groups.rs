//! Group manifest persistence

use std::sync::Arc;

use tracing::debug;

use tally_core::GroupMeta;
use tally_storage::CoordinationStore;

use crate::error::{BackendError, BackendResult};

/// Persists and retrieves the ordered child list of a group.
///
/// The manifest is a single atomic record; child results are materialized by
/// the caller through [`ResultStore`](crate::ResultStore), keeping the read
/// here O(1) in the number of children.
#[derive(Clone)]
pub struct GroupCoordinator {
    store: Arc<dyn CoordinationStore>,
}

impl GroupCoordinator {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    /// Persist the ordered child task identifiers for `group_id`
    pub async fn save_group(&self, group_id: &str, children: Vec<String>) -> BackendResult<()> {
        if children.is_empty() {
            return Err(BackendError::EmptyGroup(group_id.to_string()));
        }
        debug!(group_id, children = children.len(), "Saving group manifest");
        self.store
            .upsert_group(&GroupMeta::new(group_id, children))
            .await?;
        Ok(())
    }

    /// Return the persisted child order, `None` if the group is unknown
    pub async fn restore_group(&self, group_id: &str) -> BackendResult<Option<Vec<String>>> {
        let group = self.store.fetch_group(group_id).await?;
        Ok(group.map(|meta| meta.children))
    }

    /// Delete the manifest; idempotent
    pub async fn delete_group(&self, group_id: &str) -> BackendResult<()> {
        let existed = self.store.delete_group(group_id).await?;
        debug!(group_id, existed, "Deleted group manifest");
        Ok(())
    }
}
