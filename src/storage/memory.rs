//! In-memory store
//!
//! BTreeMap behind a RwLock; keys come back sorted for free.

use std::collections::BTreeMap;

use bytes::Bytes;
use parking_lot::RwLock;

use super::{validate_key, Storage};
use crate::error::{MomemError, Result};

/// Volatile store holding every buffer in memory
///
/// ## Concurrency:
/// - `entries`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - All methods use `&self`
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Storage for MemoryStore {
    fn put(&self, key: &str, data: &[u8], overwrite: bool) -> Result<()> {
        validate_key(key)?;

        let mut entries = self.entries.write();
        if !overwrite && entries.contains_key(key) {
            return Err(MomemError::AlreadyExists(key.to_string()));
        }
        entries.insert(key.to_string(), Bytes::copy_from_slice(data));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        // Cloning Bytes only bumps a refcount
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| MomemError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| MomemError::NotFound(key.to_string()))
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
