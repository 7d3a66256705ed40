//! File catalog: maps a file name to its page store.

use crate::storage::disk::PageStore;
use crate::storage::error::{StorageError, StorageResult};
use log::info;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to the name to store map. Clones refer to the same catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    files: Arc<RwLock<HashMap<String, Arc<dyn PageStore>>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `store` under its own name.
    pub fn add(&self, store: Arc<dyn PageStore>) -> StorageResult<()> {
        let mut files = self.files.write();
        let name = store.name().to_string();
        if files.contains_key(&name) {
            return Err(StorageError::NameConflict(name));
        }
        info!("Registered file '{}' ({} pages)", name, store.page_count());
        files.insert(name, store);
        Ok(())
    }

    /// Unregister `name` and hand its store back. Cached pages are the caller's concern;
    /// see `Database::remove`.
    pub fn remove(&self, name: &str) -> StorageResult<Arc<dyn PageStore>> {
        let store = self
            .files
            .write()
            .remove(name)
            .ok_or_else(|| StorageError::NameNotFound(name.to_string()))?;
        info!("Unregistered file '{}'", name);
        Ok(store)
    }

    pub fn get(&self, name: &str) -> StorageResult<Arc<dyn PageStore>> {
        self.files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NameNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        names
    }
}
