pub mod bitmap;
pub mod heap_page;

use std::fmt;

/// Identity of a page: the catalog name of its file and its zero-based page number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId {
    pub file: String,
    pub page: usize,
}

impl PageId {
    pub fn new(file: impl Into<String>, page: usize) -> Self {
        Self {
            file: file.into(),
            page,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.file, self.page)
    }
}

pub use bitmap::SlotBitmap;
pub use heap_page::HeapPage;
