//! Storage layer implementation for heapdb.
//!
//! This module provides the page-based foundation that heap files are built on:
//!
//! - **PageId**: Addresses a page by table and page number
//! - **HeapPage**: Fixed-size page holding a bitmap of used slots followed by
//!   fixed-width tuple slots
//! - **PageManager**: Reads and writes whole pages of a single file
//! - **BufferPool**: The page-fetch contract consumed by file iterators, and an
//!   LRU-backed implementation of it
//!
//! Pages are read-only once parsed; nothing in this layer writes pages back.

pub mod buffer;
pub mod disk;
pub mod error;
pub mod page;

pub use buffer::{BufferPool, BufferPoolManager};
pub use disk::PageManager;
pub use error::{StorageError, StorageResult};
pub use page::{HeapPage, PageId, Permissions};
