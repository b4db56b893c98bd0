use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::PageId;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Whole-page reads and writes against one file.
///
/// Page `k` lives at byte offset `k * page_size`. The file has no header.
#[derive(Debug)]
pub struct PageManager {
    file: File,
    page_size: usize,
}

/// Pages needed to cover `file_size` bytes. Page numbers are `u32`, so a
/// larger file cannot be addressed.
fn page_count(file_size: u64, page_size: usize) -> StorageResult<u32> {
    let pages = file_size.div_ceil(page_size as u64);
    u32::try_from(pages).map_err(|_| StorageError::TooManyPages {
        file_size,
        page_size,
    })
}

impl PageManager {
    /// Create (or truncate) a file for writing pages.
    pub fn create(path: &Path, page_size: usize) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self { file, page_size })
    }

    /// Open an existing file for reading.
    pub fn open(path: &Path, page_size: usize) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Self { file, page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn file_len(&self) -> StorageResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Number of pages, counting a trailing partial page.
    pub fn num_pages(&self) -> StorageResult<u32> {
        page_count(self.file_len()?, self.page_size)
    }

    /// Read page `page_id.page_no` into `buf`.
    ///
    /// A trailing partial page is zero-padded to the full page size.
    pub fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> StorageResult<()> {
        if buf.len() != self.page_size {
            return Err(StorageError::InvalidPageSize {
                expected: self.page_size,
                actual: buf.len(),
            });
        }

        let num_pages = self.num_pages()?;
        if page_id.page_no >= num_pages {
            return Err(StorageError::PageOutOfRange { page_id, num_pages });
        }

        self.file.seek(SeekFrom::Start(self.page_offset(page_id.page_no)))?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        buf[filled..].fill(0);

        Ok(())
    }

    /// Write `data` as page `page_no`, extending the file if necessary.
    pub fn write_page(&mut self, page_no: u32, data: &[u8]) -> StorageResult<()> {
        if data.len() != self.page_size {
            return Err(StorageError::InvalidPageSize {
                expected: self.page_size,
                actual: data.len(),
            });
        }

        self.file.seek(SeekFrom::Start(self.page_offset(page_no)))?;
        self.file.write_all(data)?;

        Ok(())
    }

    pub fn sync(&mut self) -> StorageResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn page_offset(&self, page_no: u32) -> u64 {
        page_no as u64 * self.page_size as u64
    }
}
