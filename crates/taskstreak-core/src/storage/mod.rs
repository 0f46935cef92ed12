//! Key/value storage capability used to persist state documents.

mod memory;

pub use memory::InMemoryStateStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by storage implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Requested key does not exist.
    #[error("entry not found for key: {key}")]
    NotFound { key: String },
    /// Underlying storage failure.
    #[error("storage failure: {reason}")]
    Storage { reason: String },
}

/// Opaque byte store. Callers own the encoding of what they put in it.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Persist a value under a key, overwriting any existing entry.
    async fn write(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Retrieve the value for a key.
    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Remove a key and its value (idempotent).
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
