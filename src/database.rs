use crate::access::{HeapFile, TupleDesc};
use crate::catalog::Catalog;
use crate::config::StorageConfig;
use crate::storage::buffer::lru::LruReplacer;
use crate::storage::buffer::BufferPool;
use crate::storage::disk::{DbFile, PageStore};
use crate::storage::error::{StorageError, StorageResult};
use log::warn;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// A catalog of files plus the one buffer pool caching their pages.
pub struct Database {
    config: StorageConfig,
    catalog: Catalog,
    buffer_pool: Arc<Mutex<BufferPool>>,
}

impl Database {
    pub fn new(config: StorageConfig) -> Self {
        let catalog = Catalog::new();
        let replacer = Box::new(LruReplacer::new(config.pool_pages));
        let buffer_pool = BufferPool::new(
            catalog.clone(),
            replacer,
            config.pool_pages,
            config.page_size,
        );

        Self {
            config,
            catalog,
            buffer_pool: Arc::new(Mutex::new(buffer_pool)),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> Arc<Mutex<BufferPool>> {
        self.buffer_pool.clone()
    }

    /// Register a store. Its page size must match the database's.
    pub fn add(&self, store: Arc<dyn PageStore>) -> StorageResult<()> {
        if store.page_size() != self.config.page_size {
            return Err(StorageError::PageSizeMismatch {
                expected: self.config.page_size,
                actual: store.page_size(),
            });
        }
        self.catalog.add(store)
    }

    pub fn get(&self, name: &str) -> StorageResult<Arc<dyn PageStore>> {
        self.catalog.get(name)
    }

    /// Unregister `name`, first flushing and then discarding its cached pages so no
    /// page of the removed file can later be written back. The pool stays locked for
    /// the whole sequence.
    pub fn remove(&self, name: &str) -> StorageResult<Arc<dyn PageStore>> {
        if !self.catalog.contains(name) {
            return Err(StorageError::NameNotFound(name.to_string()));
        }

        let mut pool = self.buffer_pool.lock();
        pool.flush_file(name)?;
        pool.discard_file(name)?;
        self.catalog.remove(name)
    }

    /// Create (truncating) the file at `path`, register it as `name` and open it as a
    /// heap file with schema `desc`.
    pub fn create_heap_file(
        &self,
        name: &str,
        path: &Path,
        desc: TupleDesc,
    ) -> StorageResult<HeapFile> {
        self.check_name_free(name)?;
        let store = Arc::new(DbFile::create(name, path, self.config.page_size)?);
        self.register_heap_file(store, desc)
    }

    /// Open (creating if missing) the file at `path`, register it as `name` and open it
    /// as a heap file with schema `desc`.
    pub fn open_heap_file(&self, name: &str, path: &Path, desc: TupleDesc) -> StorageResult<HeapFile> {
        self.check_name_free(name)?;
        let store = Arc::new(DbFile::open(name, path, self.config.page_size)?);
        self.register_heap_file(store, desc)
    }

    /// Write every dirty page back to its store.
    pub fn flush(&self) -> StorageResult<()> {
        self.buffer_pool.lock().flush_all()
    }

    fn register_heap_file(&self, store: Arc<DbFile>, desc: TupleDesc) -> StorageResult<HeapFile> {
        self.add(store.clone())?;
        match HeapFile::new(store.clone(), desc, self.buffer_pool.clone()) {
            Ok(heap) => Ok(heap),
            Err(e) => {
                self.catalog.remove(store.name())?;
                Err(e)
            }
        }
    }

    fn check_name_free(&self, name: &str) -> StorageResult<()> {
        if self.catalog.contains(name) {
            return Err(StorageError::NameConflict(name.to_string()));
        }
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Best effort flush on drop
        if let Err(e) = self.flush() {
            warn!("Failed to flush database on drop: {}", e);
        }
    }
}
