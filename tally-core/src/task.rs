//! Task result records and their state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a task result.
///
/// Serialized as SCREAMING_SNAKE_CASE to match the wire states the dispatch
/// engine exchanges with workers (PENDING / STARTED / RETRY / FAILURE /
/// SUCCESS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Started,
    Retry,
    Failure,
    Success,
}

impl TaskState {
    /// Whether this state is terminal (the task will not change state again)
    pub fn is_ready(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }

    /// Whether this state represents a successful completion
    pub fn is_successful(&self) -> bool {
        matches!(self, TaskState::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Started => "STARTED",
            TaskState::Retry => "RETRY",
            TaskState::Failure => "FAILURE",
            TaskState::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskState::Pending),
            "STARTED" => Ok(TaskState::Started),
            "RETRY" => Ok(TaskState::Retry),
            "FAILURE" => Ok(TaskState::Failure),
            "SUCCESS" => Ok(TaskState::Success),
            other => Err(format!("unknown task state: {}", other)),
        }
    }
}

/// Persisted outcome of a single task.
///
/// The result payload is an opaque serialized blob; its meaning is owned by
/// the caller and this layer never inspects it. `traceback` is only present
/// for FAILURE records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    /// Task identifier (opaque, globally unique within a store namespace)
    pub task_id: String,

    /// Current lifecycle state
    pub state: TaskState,

    /// Serialized result payload, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<u8>>,

    /// Serialized failure detail, present only when state is FAILURE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,

    /// When the record was last written
    pub date_done: Option<DateTime<Utc>>,
}

impl TaskMeta {
    /// The canonical record returned for an identifier that was never stored.
    ///
    /// Absence is ambiguous between "not started" and "record purged", so a
    /// read never reports absence; it reports this default instead.
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            state: TaskState::Pending,
            result: None,
            traceback: None,
            date_done: None,
        }
    }
}

/// Outcome of a task-meta read, making the "stored vs. default" distinction
/// explicit instead of relying on a runtime convention.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskLookup {
    /// A record was found in the store
    Stored(TaskMeta),

    /// No record exists; carries the canonical PENDING default
    Pending(TaskMeta),
}

impl TaskLookup {
    /// Whether the read hit a persisted record
    pub fn is_stored(&self) -> bool {
        matches!(self, TaskLookup::Stored(_))
    }

    pub fn meta(&self) -> &TaskMeta {
        match self {
            TaskLookup::Stored(meta) | TaskLookup::Pending(meta) => meta,
        }
    }

    pub fn into_meta(self) -> TaskMeta {
        match self {
            TaskLookup::Stored(meta) | TaskLookup::Pending(meta) => meta,
        }
    }
}
