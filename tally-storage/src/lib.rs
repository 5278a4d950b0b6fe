//! Storage abstraction for the Tally result backend
//!
//! This crate defines the [`CoordinationStore`] capability contract the
//! coordination engine is layered on: keyed upsert/read/delete over three
//! partitioned collections (task results, group manifests, chord counters),
//! one atomic increment-and-return, and one atomic delete-if-exists usable as
//! a one-time claim. Two implementations are provided: SQLite over a connection pool
//! (feature `sqlite`, on by default) and an in-memory store for tests and
//! development.

pub mod config;
pub mod error;
pub mod memory;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export core types for convenience
pub use config::{BackendConfig, DatabaseConfig};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use store::{CoordinationStore, SweepReport};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
