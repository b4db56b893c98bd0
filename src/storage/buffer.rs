pub mod lru;
pub mod replacer;

use crate::catalog::Catalog;
use crate::config::StorageConfig;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{HeapPage, PageId, Permissions};
use crate::transaction::{TransactionId, TransactionManager};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use replacer::{FrameId, Replacer};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// The page-fetch contract file iterators read through.
///
/// Implementations decide caching, eviction and locking. Repeated requests for
/// a page within a transaction should observe the same page.
pub trait BufferPool: Send + Sync {
    fn get_page(
        &self,
        tid: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> StorageResult<Arc<HeapPage>>;
}

struct Frame {
    page_id: PageId,
    page: Arc<HeapPage>,
}

/// A bounded page cache with LRU eviction.
///
/// Pages are resolved through the catalog and read from their heap file on a
/// miss. Pages are never modified, so eviction never writes back.
#[derive(Clone)]
pub struct BufferPoolManager {
    inner: Arc<BufferPoolInner>,
}

struct BufferPoolInner {
    catalog: Arc<Catalog>,
    transactions: Arc<TransactionManager>,
    page_table: DashMap<PageId, FrameId>,
    frames: RwLock<HashMap<FrameId, Frame>>,
    replacer: Mutex<Box<dyn Replacer>>,
    next_frame_id: AtomicU32,
    max_frames: usize,
}

impl BufferPoolManager {
    pub fn new(
        catalog: Arc<Catalog>,
        transactions: Arc<TransactionManager>,
        config: &StorageConfig,
    ) -> StorageResult<Self> {
        config.validate()?;
        let replacer = Box::new(lru::LruReplacer::new(config.buffer_pool_frames));
        Ok(Self::with_replacer(
            catalog,
            transactions,
            replacer,
            config.buffer_pool_frames,
        ))
    }

    pub fn with_replacer(
        catalog: Arc<Catalog>,
        transactions: Arc<TransactionManager>,
        replacer: Box<dyn Replacer>,
        max_frames: usize,
    ) -> Self {
        Self {
            inner: Arc::new(BufferPoolInner {
                catalog,
                transactions,
                page_table: DashMap::new(),
                frames: RwLock::new(HashMap::with_capacity(max_frames)),
                replacer: Mutex::new(replacer),
                next_frame_id: AtomicU32::new(0),
                max_frames,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.max_frames
    }

    pub fn resident_pages(&self) -> usize {
        self.inner.frames.read().len()
    }

    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.inner.page_table.contains_key(&page_id)
    }

    /// Drop `page_id` from the pool. The next request rereads it from disk.
    pub fn discard_page(&self, page_id: PageId) {
        let mut frames = self.inner.frames.write();
        if let Some((_, frame_id)) = self.inner.page_table.remove(&page_id) {
            frames.remove(&frame_id);
            self.inner.replacer.lock().remove(frame_id);
            log::debug!("Discarded {} from frame {}", page_id, frame_id);
        }
    }

    /// Look up a resident page. The frames lock is held across the page table
    /// lookup so an eviction cannot hand the frame to another page in between.
    fn cached(&self, page_id: PageId) -> Option<Arc<HeapPage>> {
        let frames = self.inner.frames.read();
        let frame_id = self.inner.page_table.get(&page_id).map(|e| *e.value())?;
        let frame = frames.get(&frame_id).filter(|f| f.page_id == page_id)?;
        self.inner.replacer.lock().record_access(frame_id);
        Some(frame.page.clone())
    }

    fn read_from_disk(&self, page_id: PageId) -> StorageResult<HeapPage> {
        let file = self
            .inner
            .catalog
            .file(page_id.table_id)
            .map_err(|_| StorageError::UnknownTable(page_id.table_id))?;
        file.read_page(page_id)
    }

    /// Place a freshly read page, evicting if the pool is full. If another
    /// caller loaded the same page meanwhile, theirs wins.
    fn install(&self, page_id: PageId, page: Arc<HeapPage>) -> StorageResult<Arc<HeapPage>> {
        let mut frames = self.inner.frames.write();

        if let Some(frame_id) = self.inner.page_table.get(&page_id).map(|e| *e.value()) {
            if let Some(frame) = frames.get(&frame_id).filter(|f| f.page_id == page_id) {
                self.inner.replacer.lock().record_access(frame_id);
                return Ok(frame.page.clone());
            }
        }

        let frame_id = if frames.len() < self.inner.max_frames {
            self.inner.next_frame_id.fetch_add(1, Ordering::SeqCst)
        } else {
            let victim = self
                .inner
                .replacer
                .lock()
                .evict()
                .ok_or(StorageError::BufferPoolFull)?;
            if let Some(old) = frames.remove(&victim) {
                self.inner.page_table.remove(&old.page_id);
                log::debug!("Evicted {} from frame {}", old.page_id, victim);
            }
            victim
        };

        frames.insert(
            frame_id,
            Frame {
                page_id,
                page: page.clone(),
            },
        );
        self.inner.page_table.insert(page_id, frame_id);
        self.inner.replacer.lock().record_access(frame_id);

        Ok(page)
    }
}

impl BufferPool for BufferPoolManager {
    fn get_page(
        &self,
        tid: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> StorageResult<Arc<HeapPage>> {
        if !self.inner.transactions.is_active(tid) {
            return Err(StorageError::TransactionAborted(tid));
        }

        if let Some(page) = self.cached(page_id) {
            log::trace!("{} hit for {} ({:?})", tid, page_id, perm);
            return Ok(page);
        }

        log::debug!("{} miss for {} ({:?})", tid, page_id, perm);
        let page = Arc::new(self.read_from_disk(page_id)?);
        self.install(page_id, page)
    }
}
