//! Storage layer implementation for heapstore.
//!
//! This module provides the foundation for persistent data storage using a page-based
//! architecture. Key components:
//!
//! - **PageStore / DbFile**: Fixed-size block I/O against one OS file per table
//! - **BufferPool**: In-memory cache of pages with strict LRU eviction
//! - **HeapPage**: Slotted page format for fixed-length tuples, with an occupancy bitmap

pub mod buffer;
pub mod disk;
pub mod error;
pub mod page;

pub use buffer::{BufferPool, DEFAULT_NUM_PAGES};
pub use disk::{DbFile, PageStore, PAGE_SIZE};
pub use error::{StorageError, StorageResult};
pub use page::{HeapPage, PageId};
