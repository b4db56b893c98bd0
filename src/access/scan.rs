//! Sequential access to every tuple of a heap file.

use crate::access::error::IterationError;
use crate::access::heap::HeapFile;
use crate::access::tuple::Tuple;
use crate::storage::buffer::BufferPool;
use crate::storage::error::StorageResult;
use crate::storage::page::{HeapPage, PageId, Permissions};
use crate::transaction::TransactionId;
use std::sync::Arc;

/// A restartable cursor over the tuples of a file.
///
/// A fresh iterator is unopened; `open` positions it before the first tuple,
/// `close` releases it and `rewind` is a close followed by an open.
pub trait DbFileIterator {
    fn open(&mut self) -> Result<(), IterationError>;

    /// Whether `next` would return a tuple. Always false when not open.
    fn has_next(&mut self) -> Result<bool, IterationError>;

    /// The next tuple, or `NoSuchElement` if not open or exhausted.
    fn next(&mut self) -> Result<Tuple, IterationError>;

    fn rewind(&mut self) -> Result<(), IterationError>;

    fn close(&mut self);

    /// Borrow this cursor as a standard iterator. Iteration ends when the
    /// cursor is exhausted or after the first error.
    fn tuples(&mut self) -> Tuples<'_, Self>
    where
        Self: Sized,
    {
        Tuples {
            inner: self,
            failed: false,
        }
    }
}

/// Standard iterator adapter returned by [`DbFileIterator::tuples`].
pub struct Tuples<'a, I: DbFileIterator> {
    inner: &'a mut I,
    failed: bool,
}

impl<I: DbFileIterator> Iterator for Tuples<'_, I> {
    type Item = Result<Tuple, IterationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = match self.inner.has_next() {
            Ok(false) => return None,
            Ok(true) => self.inner.next(),
            Err(e) => Err(e),
        };
        self.failed = result.is_err();
        Some(result)
    }
}

/// Two-level position: the page currently held and the slot to examine next.
struct Cursor {
    /// Page number of `page`, or 0 with no page when the file was empty.
    page_no: u32,
    page: Option<Arc<HeapPage>>,
    slot: usize,
}

enum State {
    Unopened,
    Open(Cursor),
    Closed,
}

/// Iterates a heap file page by page through a buffer pool.
///
/// Only one page is held at a time; the next page is fetched when the current
/// one has no used slots left. Pages without tuples are skipped.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    tid: TransactionId,
    pool: Arc<dyn BufferPool>,
    state: State,
}

impl HeapFileIterator {
    pub fn new(file: Arc<HeapFile>, tid: TransactionId, pool: Arc<dyn BufferPool>) -> Self {
        Self {
            file,
            tid,
            pool,
            state: State::Unopened,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    fn fetch(&self, page_no: u32) -> StorageResult<Arc<HeapPage>> {
        fetch_page(&*self.pool, self.tid, &self.file, page_no)
    }

    /// Move the cursor to the next used slot, fetching later pages as needed.
    /// Returns false when not open or when no page from the cursor onwards
    /// holds another tuple. Calling it again without consuming is a no-op.
    fn advance(&mut self) -> Result<bool, IterationError> {
        let Self {
            file,
            tid,
            pool,
            state,
        } = self;
        let State::Open(cursor) = state else {
            return Ok(false);
        };

        loop {
            if let Some(page) = &cursor.page {
                if let Some(slot) = page.next_used_slot(cursor.slot) {
                    cursor.slot = slot;
                    return Ok(true);
                }
            }

            let next_page_no = match cursor.page {
                Some(_) => cursor.page_no + 1,
                None => 0,
            };
            if next_page_no >= file.num_pages()? {
                return Ok(false);
            }

            log::debug!("{} advancing scan of table {} to page {}", tid, file.id(), next_page_no);
            cursor.page = Some(fetch_page(&**pool, *tid, file, next_page_no)?);
            cursor.page_no = next_page_no;
            cursor.slot = 0;
        }
    }
}

impl DbFileIterator for HeapFileIterator {
    fn open(&mut self) -> Result<(), IterationError> {
        self.state = State::Closed;

        let page = if self.file.num_pages()? > 0 {
            Some(self.fetch(0)?)
        } else {
            None
        };

        self.state = State::Open(Cursor {
            page_no: 0,
            page,
            slot: 0,
        });
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, IterationError> {
        self.advance()
    }

    fn next(&mut self) -> Result<Tuple, IterationError> {
        if !self.advance()? {
            return Err(IterationError::NoSuchElement);
        }

        let State::Open(cursor) = &mut self.state else {
            return Err(IterationError::NoSuchElement);
        };
        let tuple = cursor
            .page
            .as_ref()
            .and_then(|page| page.tuple(cursor.slot))
            .cloned()
            .ok_or(IterationError::NoSuchElement)?;
        cursor.slot += 1;
        Ok(tuple)
    }

    fn rewind(&mut self) -> Result<(), IterationError> {
        self.close();
        self.open()
    }

    fn close(&mut self) {
        self.state = State::Closed;
    }
}

fn fetch_page(
    pool: &dyn BufferPool,
    tid: TransactionId,
    file: &HeapFile,
    page_no: u32,
) -> StorageResult<Arc<HeapPage>> {
    pool.get_page(tid, PageId::new(file.id(), page_no), Permissions::ReadOnly)
}
