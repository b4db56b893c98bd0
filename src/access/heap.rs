use crate::access::scan::HeapFileIterator;
use crate::access::schema::Schema;
use crate::catalog::TableId;
use crate::config::StorageConfig;
use crate::storage::buffer::BufferPool;
use crate::storage::disk::PageManager;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{HeapPage, PageId};
use crate::transaction::TransactionId;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An unordered collection of tuples stored in fixed-size pages of one file.
///
/// Page `k` exists for every `k` below [`HeapFile::num_pages`]; there are no
/// holes. The file holds no header of its own, so the schema and page size
/// are supplied by whoever opens it.
#[derive(Debug)]
pub struct HeapFile {
    path: PathBuf,
    id: TableId,
    schema: Arc<Schema>,
    page_size: usize,
    disk: Mutex<PageManager>,
}

impl HeapFile {
    /// Bind an existing file.
    pub fn open(path: impl AsRef<Path>, schema: Arc<Schema>, config: &StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        let path = std::path::absolute(path.as_ref())?;
        let disk = PageManager::open(&path, config.page_size)?;
        let id = table_id_for_path(&path);

        log::debug!("Opened heap file {} as table {}", path.display(), id);
        Ok(Self {
            path,
            id,
            schema,
            page_size: config.page_size,
            disk: Mutex::new(disk),
        })
    }

    /// Stable identifier derived from the absolute path.
    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages in the file right now, counting a trailing partial page.
    pub fn num_pages(&self) -> StorageResult<u32> {
        self.disk.lock().num_pages()
    }

    /// Read and parse one page straight from disk, bypassing any cache.
    pub fn read_page(&self, page_id: PageId) -> StorageResult<HeapPage> {
        if page_id.table_id != self.id {
            return Err(StorageError::TableMismatch {
                page_id,
                table_id: self.id,
            });
        }

        let mut buf = vec![0u8; self.page_size];
        self.disk.lock().read_page(page_id, &mut buf)?;
        log::debug!("Read {} from {}", page_id, self.path.display());

        HeapPage::new(page_id, self.schema.clone(), self.page_size, buf)
    }

    /// Iterator over every tuple in the file, reading pages through `pool`
    /// on behalf of `tid`. The iterator starts unopened.
    pub fn iterator(self: &Arc<Self>, tid: TransactionId, pool: Arc<dyn BufferPool>) -> HeapFileIterator {
        HeapFileIterator::new(self.clone(), tid, pool)
    }
}

/// 32-bit FNV-1a over the path bytes. Stable across runs and toolchains,
/// unlike `std`'s default hasher.
pub fn table_id_for_path(path: &Path) -> TableId {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    let hash = path
        .as_os_str()
        .as_encoded_bytes()
        .iter()
        .fold(OFFSET_BASIS, |hash, &b| (hash ^ b as u32).wrapping_mul(PRIME));
    TableId(hash)
}
