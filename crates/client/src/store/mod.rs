//! Persistent local store
//!
//! Durable key/value storage surviving process restarts, the only shared
//! resource between the guest cart manager and the sync coordinator. Access
//! is synchronous; cross-process writers race with last-write-wins, which
//! callers accept.

use thiserror::Error;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by local store access.
///
/// Callers that read cart state treat any of these as "no stored cart";
/// corruption must never block shopping.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("storage i/o failed")]
    Io(#[from] std::io::Error),

    /// A concurrent writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Durable key/value storage with overwrite semantics.
pub trait LocalStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing storage cannot be written.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes the record under `key` entirely; absent keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing storage cannot be written.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
