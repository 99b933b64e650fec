//! Top-level error type for a run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::ports::{SinkError, SourceError, StoreError};
use crate::snapshot::SnapshotError;

/// Umbrella error for everything a run can fail with.
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration problem; the run aborts before side effects.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Project data source failure.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Messaging sink failure.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// Object store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Snapshot invariant violation.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// Persisted snapshot could not be encoded or decoded.
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
