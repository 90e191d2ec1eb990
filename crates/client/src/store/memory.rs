//! In-memory store

use std::collections::HashMap;
use std::sync::Mutex;

use super::{LocalStore, StoreError};

/// Ephemeral [`LocalStore`] backed by a mutex-guarded map.
///
/// Used in tests and for sessions that do not opt into durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;

        Ok(records.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;

        records.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;

        records.remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn put_overwrites_previous_value() -> TestResult {
        let store = MemoryStore::new();

        store.put("cart", "first")?;
        store.put("cart", "second")?;

        assert_eq!(store.get("cart")?.as_deref(), Some("second"));

        Ok(())
    }

    #[test]
    fn delete_removes_the_record_entirely() -> TestResult {
        let store = MemoryStore::new();

        store.put("cart", "value")?;
        store.delete("cart")?;
        store.delete("cart")?;

        assert_eq!(store.get("cart")?, None);

        Ok(())
    }
}
