//! Group manifests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted manifest of a group: the ordered child task identifiers.
///
/// Order is significant: it is the only way to map positional results back
/// to their origin. The manifest is written and read as a single atomic
/// record; child results are materialized separately by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMeta {
    /// Group identifier
    pub group_id: String,

    /// Ordered child task identifiers
    pub children: Vec<String>,

    /// When the manifest was created
    pub created_at: DateTime<Utc>,
}

impl GroupMeta {
    pub fn new(group_id: impl Into<String>, children: Vec<String>) -> Self {
        Self {
            group_id: group_id.into(),
            children,
            created_at: Utc::now(),
        }
    }
}
