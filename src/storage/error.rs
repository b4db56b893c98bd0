//! Storage layer error types.

use crate::catalog::TableId;
use crate::config::ConfigError;
use crate::storage::page::PageId;
use crate::transaction::TransactionId;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Page out of range: {page_id} (file has {num_pages} pages)")]
    PageOutOfRange { page_id: PageId, num_pages: u32 },

    #[error("Page {page_id} does not belong to table {table_id}")]
    TableMismatch { page_id: PageId, table_id: TableId },

    #[error("Corrupt page {page_id}: {reason}")]
    CorruptPage { page_id: PageId, reason: String },

    #[error("Invalid page buffer size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("File of {file_size} bytes exceeds the addressable pages of size {page_size}")]
    TooManyPages { file_size: u64, page_size: usize },

    #[error("Unknown table: {0}")]
    UnknownTable(TableId),

    #[error("Transaction {0} is not active")]
    TransactionAborted(TransactionId),

    #[error("Buffer pool is full: no frame can be evicted")]
    BufferPoolFull,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
