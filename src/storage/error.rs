//! Storage layer error types.

use crate::storage::page::PageId;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Tuple does not match the schema")]
    SchemaMismatch,

    #[error("No such field: {0}")]
    FieldNotFound(String),

    #[error("Field index {index} out of range (fields: {size})")]
    FieldIndexOutOfRange { index: usize, size: usize },

    #[error("Buffer too small: requires {required} bytes but only {available} available")]
    BufferTooSmall { required: usize, available: usize },

    #[error("Page not resident in buffer pool: {0}")]
    NotResident(PageId),

    #[error("Slot {slot} is not occupied")]
    SlotNotOccupied { slot: usize },

    #[error("Invalid slot: {slot} (capacity: {capacity})")]
    InvalidSlot { slot: usize, capacity: usize },

    #[error("Page {page} out of bounds for file '{file}' ({page_count} pages)")]
    PageOutOfBounds {
        file: String,
        page: usize,
        page_count: usize,
    },

    #[error("Page size mismatch: expected {expected} bytes, got {actual}")]
    PageSizeMismatch { expected: usize, actual: usize },

    #[error("Invalid page size: {0}")]
    InvalidPageSize(usize),

    #[error("File name already registered: {0}")]
    NameConflict(String),

    #[error("File name '{0}' is now bound to a different store")]
    FileReplaced(String),

    #[error("No such file: {0}")]
    NameNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
