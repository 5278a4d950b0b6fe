//! Chord completion coordination
//!
//! Many uncoordinated worker processes must agree exactly once that a chord's
//! fan-out is complete. The protocol uses two atomic store operations per
//! completing part, never a read-decide-write:
//!
//! 1. Atomic increment-and-return. Post-increment values are strictly ordered
//!    and distinct, so exactly one caller observes the expected size.
//! 2. The claim: an atomic delete-if-exists of the counter record. Counter
//!    equality alone cannot guard against a redelivered completion signal
//!    recomputing the same logical completion, so only the caller whose
//!    delete actually removed the record releases the callback path.

use std::sync::Arc;

use tracing::{debug, error, warn};

use tally_core::{ChordMeta, ChordReadiness};
use tally_storage::CoordinationStore;

use crate::error::{BackendError, BackendResult};

/// Tracks expected vs. completed counts per chord and arbitrates the
/// one-time release of the aggregating callback.
#[derive(Clone)]
pub struct ChordCoordinator {
    store: Arc<dyn CoordinationStore>,
}

impl ChordCoordinator {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    /// Register a chord before any child can complete.
    ///
    /// The dispatcher calls this exactly once per chord; calling it again
    /// overwrites the prior counter.
    pub async fn set_chord_size(&self, chord_id: &str, size: i64) -> BackendResult<()> {
        if size <= 0 {
            return Err(BackendError::InvalidChordSize(chord_id.to_string()));
        }
        debug!(chord_id, size, "Registering chord");
        self.store.init_chord(&ChordMeta::new(chord_id, size)).await?;
        Ok(())
    }

    /// Current counter state, for diagnostics only.
    ///
    /// The finalization decision never reads this; it is made solely from
    /// the post-increment value inside [`on_chord_part_return`].
    ///
    /// [`on_chord_part_return`]: ChordCoordinator::on_chord_part_return
    pub async fn get_chord_meta(&self, chord_id: &str) -> BackendResult<Option<ChordMeta>> {
        Ok(self.store.fetch_chord(chord_id).await?)
    }

    /// Atomically advance the chord's counter, returning the post-increment
    /// value, or `None` if the chord record is absent
    pub async fn incr_chord_counter(&self, chord_id: &str) -> BackendResult<Option<i64>> {
        Ok(self.store.incr_chord(chord_id).await?)
    }

    /// Report one part's completion and decide readiness.
    ///
    /// Returns [`ChordReadiness::Ready`] to exactly one caller per chord;
    /// that caller proceeds to assemble the group results and dispatch the
    /// callback. A counter past `expected_size` is an invariant violation
    /// (duplicate delivery or earlier bug) and is surfaced as
    /// [`BackendError::ChordOverrun`] without re-triggering anything.
    pub async fn on_chord_part_return(
        &self,
        chord_id: &str,
        expected_size: i64,
    ) -> BackendResult<ChordReadiness> {
        let Some(completed) = self.store.incr_chord(chord_id).await? else {
            // Counter already claimed (or never set): a late or redelivered
            // signal after finalization.
            warn!(chord_id, "Part returned for a chord with no counter record");
            return Ok(ChordReadiness::AlreadyFinalized);
        };

        if completed < expected_size {
            debug!(chord_id, completed, expected_size, "Chord part counted");
            return Ok(ChordReadiness::NotReady { completed });
        }

        if completed > expected_size {
            error!(
                chord_id,
                completed, expected_size, "Chord counter overran its expected size"
            );
            return Err(BackendError::ChordOverrun {
                chord_id: chord_id.to_string(),
                completed,
                expected: expected_size,
            });
        }

        // This caller observed completed == expected_size; the claim decides
        // whether it is also the one that finalizes.
        if self.store.claim_chord(chord_id).await? {
            debug!(chord_id, expected_size, "Chord complete, claim won");
            Ok(ChordReadiness::Ready)
        } else {
            warn!(chord_id, "Chord claim lost: already finalized");
            Ok(ChordReadiness::AlreadyFinalized)
        }
    }

    /// Remove the counter record; idempotent cleanup
    pub async fn delete_chord(&self, chord_id: &str) -> BackendResult<()> {
        let existed = self.store.claim_chord(chord_id).await?;
        debug!(chord_id, existed, "Deleted chord counter");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_storage::InMemoryStore;

    fn coordinator() -> ChordCoordinator {
        ChordCoordinator::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn zero_size_is_rejected() {
        let chords = coordinator();
        let err = chords.set_chord_size("c1", 0).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidChordSize(_)));
    }

    #[tokio::test]
    async fn last_part_is_ready_and_only_the_last() {
        let chords = coordinator();
        chords.set_chord_size("c1", 3).await.unwrap();

        assert_eq!(
            chords.on_chord_part_return("c1", 3).await.unwrap(),
            ChordReadiness::NotReady { completed: 1 }
        );
        assert_eq!(
            chords.on_chord_part_return("c1", 3).await.unwrap(),
            ChordReadiness::NotReady { completed: 2 }
        );
        assert!(chords.on_chord_part_return("c1", 3).await.unwrap().is_ready());
    }

    #[tokio::test]
    async fn redelivery_after_finalization_does_not_retrigger() {
        let chords = coordinator();
        chords.set_chord_size("c1", 1).await.unwrap();

        assert!(chords.on_chord_part_return("c1", 1).await.unwrap().is_ready());
        // Counter record is gone; the redelivered signal sees no chord
        assert_eq!(
            chords.on_chord_part_return("c1", 1).await.unwrap(),
            ChordReadiness::AlreadyFinalized
        );
    }

    #[tokio::test]
    async fn overrun_is_an_error_not_a_second_release() {
        let chords = coordinator();
        chords.set_chord_size("c1", 2).await.unwrap();

        // Simulate a duplicated increment before the equality point
        chords.incr_chord_counter("c1").await.unwrap();
        chords.incr_chord_counter("c1").await.unwrap();
        chords.incr_chord_counter("c1").await.unwrap();

        let err = chords.on_chord_part_return("c1", 2).await.unwrap_err();
        assert!(matches!(err, BackendError::ChordOverrun { completed: 4, .. }));
    }

    #[tokio::test]
    async fn get_chord_meta_reports_progress() {
        let chords = coordinator();
        chords.set_chord_size("c1", 5).await.unwrap();
        chords.incr_chord_counter("c1").await.unwrap();
        chords.incr_chord_counter("c1").await.unwrap();

        let meta = chords.get_chord_meta("c1").await.unwrap().unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta.completed, 2);
        assert_eq!(chords.get_chord_meta("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_parts_release_exactly_once() {
        let chords = coordinator();
        let n: i64 = 32;
        chords.set_chord_size("c1", n).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..n {
            let chords = chords.clone();
            handles.push(tokio::spawn(async move {
                chords.on_chord_part_return("c1", n).await.unwrap()
            }));
        }

        let mut ready = 0;
        for handle in handles {
            if handle.await.unwrap().is_ready() {
                ready += 1;
            }
        }
        assert_eq!(ready, 1);
    }
}
