//! Result lifecycle and chord completion coordination
//!
//! This crate is the engine a task-dispatch system calls to persist task
//! outcomes and coordinate composite work structures across independent
//! worker processes:
//!
//! - [`ResultStore`]: CRUD over individual task outcomes; unknown
//!   identifiers read as a canonical PENDING default, never as absence.
//! - [`GroupCoordinator`]: the ordered child manifest of a group, persisted
//!   as one atomic record.
//! - [`ChordCoordinator`]: the exactly-once completion protocol: an atomic
//!   increment-and-return to detect the final part, then an atomic
//!   delete-if-exists claim to arbitrate redeliveries.
//! - [`ExpirationSweeper`]: caller-driven batch removal of expired records.
//! - [`ResultBackend`]: the facade bundling the above behind one store
//!   handle, with payload encoding via [`tally_core::PayloadCodec`].
//!
//! Correctness never relies on in-process locks: every coordination decision
//! is a single atomic operation in the underlying store, so the guarantees
//! hold across processes that share nothing but the database.

pub mod backend;
pub mod chords;
pub mod error;
pub mod groups;
pub mod result_store;
pub mod sweeper;

// Re-export the consumer-facing surface
pub use backend::ResultBackend;
pub use chords::ChordCoordinator;
pub use error::{BackendError, BackendResult};
pub use groups::GroupCoordinator;
pub use result_store::ResultStore;
pub use sweeper::ExpirationSweeper;

// Domain types callers need alongside the engine
pub use tally_core::{ChordMeta, ChordReadiness, GroupMeta, TaskLookup, TaskMeta, TaskState};
pub use tally_storage::{BackendConfig, DatabaseConfig, SweepReport};
