//! Chord counter records and readiness signals

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted counter record for a chord.
///
/// `size` is set once at submission and immutable thereafter; `completed` is
/// only ever advanced by the store's atomic increment. The record is removed
/// by the one-time finalization claim (or by the sweeper for abandoned
/// chords), so its absence means "never set" or "already finalized".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordMeta {
    /// Chord identifier (equal to the underlying group identifier)
    pub chord_id: String,

    /// Expected number of child completions
    pub size: i64,

    /// Completions counted so far (post-increment values are 1..=size)
    pub completed: i64,

    /// When the chord was registered
    pub created_at: DateTime<Utc>,
}

impl ChordMeta {
    pub fn new(chord_id: impl Into<String>, size: i64) -> Self {
        Self {
            chord_id: chord_id.into(),
            size,
            completed: 0,
            created_at: Utc::now(),
        }
    }
}

/// Result of reporting one chord part's completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordReadiness {
    /// This caller's increment reached the expected size and its claim
    /// succeeded: it alone releases the callback-dispatch path.
    Ready,

    /// More parts are still outstanding
    NotReady {
        /// Completions counted so far, including this one
        completed: i64,
    },

    /// The chord was already finalized (redelivered or retried signal);
    /// the callback must not be dispatched again.
    AlreadyFinalized,
}

impl ChordReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, ChordReadiness::Ready)
    }
}
