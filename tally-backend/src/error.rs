//! Backend error types

use thiserror::Error;

use tally_core::CodecError;
use tally_storage::StoreError;

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Errors surfaced to the dispatch engine.
///
/// Store failures always propagate: a caller polling during an outage gets
/// an explicit error, never a false PENDING. Retry policy belongs to the
/// caller; this layer never retries a state mutation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The underlying store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A result payload could not be encoded or decoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A group was submitted with no children
    #[error("Group {0} has no children")]
    EmptyGroup(String),

    /// A chord was registered with a non-positive size
    #[error("Chord {0} size must be positive")]
    InvalidChordSize(String),

    /// A chord counter advanced past its expected size: a duplicate delivery
    /// or an earlier bug. The callback is not re-triggered.
    #[error("Chord {chord_id} overran: counted {completed} of {expected} expected parts")]
    ChordOverrun {
        chord_id: String,
        completed: i64,
        expected: i64,
    },
}
