// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Guarded key-value map.
//!
//! Readers share the lock; `put` and `delete` take it exclusively. The store
//! knows nothing about logging: durability is the caller's job.

use std::collections::BTreeMap;
use std::sync::RwLock;

use rustc_hash::FxHashMap;

use crate::error::{StoreError, StoreResult};
use crate::event::{Event, EventKind};

#[derive(Debug, Default)]
pub struct KeyValueStore {
    data: RwLock<FxHashMap<String, String>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Read APIs ---

    pub fn get(&self, key: &str) -> StoreResult<String> {
        let data = self.data.read().map_err(|_| StoreError::Poisoned)?;
        data.get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.data.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Sorted copy of the whole map.
    pub fn snapshot(&self) -> StoreResult<BTreeMap<String, String>> {
        let data = self.data.read().map_err(|_| StoreError::Poisoned)?;
        Ok(data.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    // --- Write APIs ---

    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> StoreResult<()> {
        let mut data = self.data.write().map_err(|_| StoreError::Poisoned)?;
        data.insert(key.into(), value.into());
        Ok(())
    }

    /// Remove `key` if present. Absent keys are not an error.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        let mut data = self.data.write().map_err(|_| StoreError::Poisoned)?;
        data.remove(key);
        Ok(())
    }

    /// Apply a replayed or freshly written event.
    pub fn apply(&self, event: &Event) -> StoreResult<()> {
        match event.kind {
            EventKind::Put => self.put(event.key.as_str(), event.value.as_str()),
            EventKind::Delete => self.delete(&event.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_poisoned_lock_surfaces() {
        let store = Arc::new(KeyValueStore::new());
        let s = store.clone();
        let _ = thread::spawn(move || {
            let _guard = s.data.write().unwrap();
            panic!("poison the store");
        })
        .join();

        assert_eq!(store.put("a", "1"), Err(StoreError::Poisoned));
        assert_eq!(store.get("a"), Err(StoreError::Poisoned));
    }
}
