//! Access layer for tuple-oriented operations.
//!
//! This module turns raw pages into logical records:
//!
//! - **Schema**: Ordered field types with optional names
//! - **Tuple**: A record conforming to a schema, tagged with where it was read
//! - **Field / FieldType**: The supported value types and their binary form
//! - **HeapFile**: A table stored as an unordered sequence of heap pages
//! - **HeapFileIterator**: A restartable cursor over every tuple of a heap file
//!
//! Pages are always fetched through a [`crate::storage::BufferPool`], so the
//! access layer never decides what stays in memory.

pub mod error;
pub mod heap;
pub mod scan;
pub mod schema;
pub mod tuple;
pub mod value;

pub use error::{CodecError, IterationError, SchemaError};
pub use heap::{table_id_for_path, HeapFile};
pub use scan::{DbFileIterator, HeapFileIterator, Tuples};
pub use schema::{Schema, SchemaField};
pub use tuple::{RecordId, Tuple};
pub use value::{Field, FieldType, STRING_LEN};
