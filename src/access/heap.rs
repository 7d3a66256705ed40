use crate::access::scan::HeapScan;
use crate::access::schema::TupleDesc;
use crate::access::tuple::{Locator, Tuple};
use crate::storage::buffer::BufferPool;
use crate::storage::disk::PageStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::heap_page::capacity_for;
use crate::storage::page::{HeapPage, PageId};
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

/// A table stored as a growable sequence of slotted pages, all sharing one schema.
///
/// Every page access goes through the shared buffer pool; mutated pages are marked dirty
/// there and reach the store when the pool flushes or evicts them. Pages are never
/// removed, only slots within them.
pub struct HeapFile {
    name: String,
    desc: TupleDesc,
    store: Arc<dyn PageStore>,
    buffer_pool: Arc<Mutex<BufferPool>>,
    capacity: usize,
}

impl HeapFile {
    /// Open a heap file over `store`, which must be registered in the pool's catalog.
    /// The handle stops working once its name is unregistered or bound to another store.
    pub fn new(
        store: Arc<dyn PageStore>,
        desc: TupleDesc,
        buffer_pool: Arc<Mutex<BufferPool>>,
    ) -> StorageResult<Self> {
        let page_size = buffer_pool.lock().page_size();
        if store.page_size() != page_size {
            return Err(StorageError::PageSizeMismatch {
                expected: page_size,
                actual: store.page_size(),
            });
        }

        let capacity = capacity_for(page_size, desc.length());
        if capacity == 0 {
            return Err(StorageError::InvalidSchema(format!(
                "{}-byte records do not fit in a {}-byte page",
                desc.length(),
                page_size
            )));
        }

        let heap = Self {
            name: store.name().to_string(),
            desc,
            store,
            buffer_pool,
            capacity,
        };
        heap.check_registered(&heap.buffer_pool.lock())?;
        Ok(heap)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    pub fn num_pages(&self) -> usize {
        self.store.page_count()
    }

    /// Slots per page.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert `tuple` into the first page with a free slot, appending a page if every
    /// existing page is full.
    pub fn insert_tuple(&self, tuple: &Tuple) -> StorageResult<Locator> {
        if !self.desc.compatible(tuple) {
            return Err(StorageError::SchemaMismatch);
        }

        let mut pool = self.buffer_pool.lock();
        self.check_registered(&pool)?;
        for page in 0..self.num_pages() {
            if let Some(slot) = self.insert_into(&mut pool, page, tuple)? {
                return Ok(Locator::new(page, slot));
            }
        }

        let page = self.store.allocate_page()?;
        debug!("Appended page {} to '{}'", page, self.name);
        match self.insert_into(&mut pool, page, tuple)? {
            Some(slot) => Ok(Locator::new(page, slot)),
            None => Err(StorageError::InvalidSchema(format!(
                "tuple does not fit in an empty page of '{}'",
                self.name
            ))),
        }
    }

    pub fn delete_tuple(&self, locator: Locator) -> StorageResult<()> {
        self.check_page(locator.page)?;
        let page_id = self.page_id(locator.page);

        let mut pool = self.buffer_pool.lock();
        self.check_registered(&pool)?;
        HeapPage::new(pool.get_page(&page_id)?, &self.desc).delete(locator.slot)?;
        pool.mark_dirty(&page_id)
    }

    pub fn get_tuple(&self, locator: Locator) -> StorageResult<Tuple> {
        self.check_page(locator.page)?;
        let page_id = self.page_id(locator.page);

        let mut pool = self.buffer_pool.lock();
        self.check_registered(&pool)?;
        HeapPage::new(pool.get_page(&page_id)?, &self.desc).get(locator.slot)
    }

    /// Locator of the first occupied slot, or `end()` if the file holds no tuples.
    pub fn begin(&self) -> StorageResult<Locator> {
        let mut pool = self.buffer_pool.lock();
        self.check_registered(&pool)?;
        for page in 0..self.num_pages() {
            let slot = HeapPage::new(pool.get_page(&self.page_id(page))?, &self.desc).begin();
            if slot != self.capacity {
                return Ok(Locator::new(page, slot));
            }
        }
        Ok(self.end())
    }

    /// The end sentinel: `(last page, capacity)`, or `(0, capacity)` for an empty file.
    pub fn end(&self) -> Locator {
        Locator::new(self.num_pages().saturating_sub(1), self.capacity)
    }

    /// Move `locator` to the next occupied slot, crossing into later pages and skipping
    /// pages with no tuples. Becomes `end()` when none remain; advancing `end()` is a no-op.
    pub fn advance(&self, locator: &mut Locator) -> StorageResult<()> {
        let end = self.end();
        if *locator == end {
            return Ok(());
        }
        self.check_page(locator.page)?;
        if locator.slot > self.capacity {
            return Err(StorageError::InvalidSlot {
                slot: locator.slot,
                capacity: self.capacity,
            });
        }

        let mut pool = self.buffer_pool.lock();
        self.check_registered(&pool)?;
        let mut page = locator.page;
        let mut slot =
            HeapPage::new(pool.get_page(&self.page_id(page))?, &self.desc).next(locator.slot);
        while slot == self.capacity {
            page += 1;
            if page >= self.num_pages() {
                *locator = end;
                return Ok(());
            }
            slot = HeapPage::new(pool.get_page(&self.page_id(page))?, &self.desc).begin();
        }

        *locator = Locator::new(page, slot);
        Ok(())
    }

    /// Iterate over every tuple in page, then slot, order.
    pub fn iter(&self) -> HeapScan<'_> {
        HeapScan::new(self)
    }

    fn insert_into(
        &self,
        pool: &mut BufferPool,
        page: usize,
        tuple: &Tuple,
    ) -> StorageResult<Option<usize>> {
        let page_id = self.page_id(page);
        let slot = HeapPage::new(pool.get_page(&page_id)?, &self.desc).insert(tuple)?;
        if slot.is_some() {
            pool.mark_dirty(&page_id)?;
        }
        Ok(slot)
    }

    /// Pages are loaded through the catalog, so it must still map this name to `store`.
    fn check_registered(&self, pool: &BufferPool) -> StorageResult<()> {
        let current = pool.catalog().get(&self.name)?;
        if !std::ptr::addr_eq(Arc::as_ptr(&current), Arc::as_ptr(&self.store)) {
            return Err(StorageError::FileReplaced(self.name.clone()));
        }
        Ok(())
    }

    fn page_id(&self, page: usize) -> PageId {
        PageId::new(self.name.as_str(), page)
    }

    fn check_page(&self, page: usize) -> StorageResult<()> {
        let page_count = self.num_pages();
        if page >= page_count {
            return Err(StorageError::PageOutOfBounds {
                file: self.name.clone(),
                page,
                page_count,
            });
        }
        Ok(())
    }
}
