//! Access layer for tuple-oriented operations.
//!
//! - **HeapFile**: A table stored as a growable sequence of slotted pages
//! - **HeapScan**: Forward iteration over every tuple of a heap file
//! - **TupleDesc**: Record layout and the fixed-width codec
//! - **Tuple / Field**: Typed rows and their values

pub mod heap;
pub mod scan;
pub mod schema;
pub mod tuple;
pub mod value;

pub use heap::HeapFile;
pub use scan::HeapScan;
pub use schema::TupleDesc;
pub use tuple::{Locator, Tuple};
pub use value::{Field, FieldType};
