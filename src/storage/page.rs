pub mod heap_page;

use crate::catalog::TableId;
use std::fmt;

/// Addresses a page: the table it belongs to and its position in that
/// table's file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: u32) -> Self {
        Self { table_id, page_no }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {} page {}", self.table_id, self.page_no)
    }
}

/// Access mode requested when fetching a page from the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permissions {
    ReadOnly,
    ReadWrite,
}

pub use heap_page::{HeapPage, HeapPageIter};
