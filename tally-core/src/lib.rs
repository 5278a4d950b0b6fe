//! Core domain model for the Tally result backend
//!
//! This crate defines the entities shared by the storage and coordination
//! layers: task result records and their state machine, group manifests,
//! chord counters, and the payload codec abstraction. It deliberately knows
//! nothing about how records are persisted; that lives in `tally-storage`.

pub mod chord;
pub mod codec;
pub mod error;
pub mod group;
pub mod task;

// Re-export core types for convenience
pub use chord::{ChordMeta, ChordReadiness};
pub use codec::{decode_payload, encode_payload, JsonCodec, PayloadCodec};
pub use error::{CodecError, CodecResult};
pub use group::GroupMeta;
pub use task::{TaskLookup, TaskMeta, TaskState};
