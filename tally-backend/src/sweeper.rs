//! Expiration sweeping

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use tally_storage::{CoordinationStore, SweepReport};

use crate::error::BackendResult;

/// Removes task, group, and chord records older than a time-to-live.
///
/// Pure batch deletion: the sweeper holds no timer and is invoked by the
/// caller, on an interval or opportunistically. Records already removed by a
/// chord claim are simply absent and cost nothing to skip.
#[derive(Clone)]
pub struct ExpirationSweeper {
    store: Arc<dyn CoordinationStore>,
}

impl ExpirationSweeper {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    /// Delete every record whose timestamp is older than `now - ttl`
    pub async fn cleanup(&self, ttl: Duration) -> BackendResult<SweepReport> {
        // A ttl too large for chrono means nothing can be expired yet
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now().checked_sub_signed(ttl).unwrap_or(DateTime::UNIX_EPOCH);
        debug!(%cutoff, "Sweeping expired records");

        let report = self.store.sweep(cutoff).await?;
        if report.total() > 0 {
            info!(
                tasks = report.tasks,
                groups = report.groups,
                chords = report.chords,
                "Swept expired records"
            );
        }
        Ok(report)
    }
}
