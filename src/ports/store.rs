//! Versioned remote object store port.

use thiserror::Error;

/// An object read from the store, with its current version tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object content; empty for a freshly initialized object.
    pub content: String,
    /// Opaque version tag to pass back on `put`.
    pub version: String,
}

/// Errors surfaced by the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object exists under the requested key.
    #[error("object {0} not found")]
    NotFound(String),
    /// The expected version no longer matches; another writer won.
    #[error("version conflict writing object {0}")]
    Conflict(String),
    /// The store rejected a request or returned a malformed response.
    #[error("object store request failed: {0}")]
    Api(String),
    /// Transport-level failure.
    #[error("object store transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Stores one versioned object per key with optimistic concurrency.
pub trait ObjectStore: Send + Sync {
    /// Reads an object and its version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no object exists under `key`.
    fn get(&self, key: &str) -> Result<StoredObject, StoreError>;

    /// Replaces an object's content, guarded by its expected version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the stored version no longer
    /// matches `expected_version`.
    fn put(&self, key: &str, content: &str, expected_version: &str) -> Result<(), StoreError>;

    /// Creates a new object under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be created.
    fn create(&self, key: &str, content: &str) -> Result<(), StoreError>;
}
