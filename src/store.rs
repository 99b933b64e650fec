//! Snapshot persistence against the versioned object store.
//!
//! One JSON snapshot object per board, addressed by a stable key. Writes
//! use optimistic concurrency: the object's version is read immediately
//! before each put, and a conflicting concurrent writer triggers a
//! bounded, linearly backed-off retry. No merge of concurrent writers is
//! attempted; merging snapshots is not well-defined.

use std::time::Duration;

use crate::error::RunError;
use crate::ports::{Clock, ObjectStore, StoreError};
use crate::snapshot::Snapshot;

/// Conflict retries before the write fails fatally.
const MAX_CONFLICT_RETRIES: u32 = 3;

/// Persists snapshots with optimistic-concurrency retry.
pub struct SnapshotStore<'a> {
    store: &'a dyn ObjectStore,
    clock: &'a dyn Clock,
}

impl<'a> SnapshotStore<'a> {
    /// Creates a store over the given object store and clock.
    #[must_use]
    pub fn new(store: &'a dyn ObjectStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Key of the snapshot object for a board.
    #[must_use]
    pub fn key_for(board_id: &str) -> String {
        format!(".data/{board_id}.json")
    }

    /// Saves the snapshot, stamping every item's `last_read` first.
    ///
    /// Stamping is the commit point that advances the comment watermark
    /// for the next run, so this must only be called once comment
    /// synchronization for the current run has completed. On a version
    /// conflict the write is retried against the freshly read version up
    /// to 3 times, sleeping 5s, 10s, then 15s; a conflict after the final
    /// retry is fatal; the computed snapshot is never silently dropped.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization failure, on non-conflict store
    /// failures, and on conflict-retry exhaustion.
    pub fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), RunError> {
        let mut stamped = snapshot.clone();
        stamped.stamp_last_read(self.clock.now());
        let content = serde_json::to_string(&stamped)?;

        let mut attempt: u32 = 1;
        loop {
            let existing = self.store.get(key)?;
            match self.store.put(key, &content, &existing.version) {
                Ok(()) => return Ok(()),
                Err(StoreError::Conflict(_)) if attempt <= MAX_CONFLICT_RETRIES => {
                    let backoff = Duration::from_secs(u64::from(attempt) * 5);
                    tracing::warn!(
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        "snapshot write conflict; backing off before retry"
                    );
                    self.clock.sleep(backoff);
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Loads the previous snapshot.
    ///
    /// Returns `None` when the object is absent or empty, the documented
    /// "no prior state" signal that suppresses notifications and comment
    /// backfill on a first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be read or parsed.
    pub fn load(&self, key: &str) -> Result<Option<Snapshot>, RunError> {
        match self.store.get(key) {
            Ok(object) if object.content.trim().is_empty() => Ok(None),
            Ok(object) => Ok(Some(serde_json::from_str(&object.content)?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Creates the snapshot object as empty if it does not exist.
    ///
    /// Pre-existing content is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check or creation fails.
    pub fn ensure_initialized(&self, key: &str) -> Result<(), RunError> {
        match self.store.get(key) {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound(_)) => {
                self.store.create(key, "")?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
