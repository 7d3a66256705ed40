//! Storage configuration.

use crate::storage::buffer::DEFAULT_NUM_PAGES;
use crate::storage::disk::PAGE_SIZE;

/// Settings shared by every file and the buffer pool of one database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Size in bytes of every page, on disk and in the pool.
    pub page_size: usize,
    /// Number of pages the buffer pool keeps resident.
    pub pool_pages: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            pool_pages: DEFAULT_NUM_PAGES,
        }
    }
}

impl StorageConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_pool_pages(mut self, pool_pages: usize) -> Self {
        self.pool_pages = pool_pages;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.pool_pages, 50);
    }

    #[test]
    fn test_builders() {
        let config = StorageConfig::default()
            .with_page_size(210)
            .with_pool_pages(2);
        assert_eq!(config, StorageConfig { page_size: 210, pool_pages: 2 });
    }
}
