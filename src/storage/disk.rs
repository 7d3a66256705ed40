//! Page stores: fixed-size block I/O by page number.

pub mod db_file;

use crate::storage::error::StorageResult;
use std::fmt::Debug;

/// Default page size shared by every file and the buffer pool.
pub const PAGE_SIZE: usize = 4096;

/// Positional page I/O for one named file. Calls are independent of each other:
/// there is no cursor.
pub trait PageStore: Send + Sync + Debug {
    /// Catalog name of the file.
    fn name(&self) -> &str;

    fn page_size(&self) -> usize;

    fn page_count(&self) -> usize;

    /// Read page `page` into `buf`, which must be exactly one page long.
    fn read_page(&self, page: usize, buf: &mut [u8]) -> StorageResult<()>;

    /// Write `data`, exactly one page long, to page `page`.
    fn write_page(&self, page: usize, data: &[u8]) -> StorageResult<()>;

    /// Append a zeroed page and return its page number.
    fn allocate_page(&self) -> StorageResult<usize>;
}

pub use db_file::DbFile;
