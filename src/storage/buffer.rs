pub mod lru;
pub mod replacer;

use crate::catalog::Catalog;
use crate::storage::disk::PageStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::PageId;
use log::{debug, warn};
use replacer::{FrameId, Replacer};
use std::collections::HashMap;
use std::sync::Arc;

/// Default number of resident pages.
pub const DEFAULT_NUM_PAGES: usize = 50;

struct Frame {
    page_id: PageId,
    data: Box<[u8]>,
    is_dirty: bool,
    /// Store the page was loaded from; write-backs go here.
    store: Arc<dyn PageStore>,
}

impl Frame {
    fn flush(&mut self) -> StorageResult<()> {
        if self.is_dirty {
            debug!("Flushing page {}", self.page_id);
            self.store.write_page(self.page_id.page, &self.data)?;
            self.is_dirty = false;
        }
        Ok(())
    }
}

/// A fixed-capacity LRU cache of pages keyed by `PageId`.
///
/// Frames live in an arena indexed by `FrameId`; the page table maps page identities to
/// frames and the replacer tracks recency. Pages returned by `get_page` borrow the pool
/// mutably, so a page view cannot outlive the next operation that might evict it.
/// Share a pool across threads behind a mutex.
pub struct BufferPool {
    catalog: Catalog,
    frames: Vec<Option<Frame>>,
    free_frames: Vec<FrameId>,
    page_table: HashMap<PageId, FrameId>,
    replacer: Box<dyn Replacer>,
    max_frames: usize,
    page_size: usize,
}

impl BufferPool {
    /// Create a pool holding at most `max_frames` pages (at least one) of `page_size`
    /// bytes. Stores are resolved by file name through `catalog`.
    pub fn new(
        catalog: Catalog,
        replacer: Box<dyn Replacer>,
        max_frames: usize,
        page_size: usize,
    ) -> Self {
        let max_frames = max_frames.max(1);
        Self {
            catalog,
            frames: Vec::with_capacity(max_frames),
            free_frames: Vec::new(),
            page_table: HashMap::with_capacity(max_frames),
            replacer,
            max_frames,
            page_size,
        }
    }

    /// Return the bytes of `page_id`, loading it on a miss, and make it the most
    /// recently used page. On a miss with a full pool the least recently used page is
    /// evicted, written back first if dirty.
    ///
    /// Call `mark_dirty` after mutating the returned bytes.
    pub fn get_page(&mut self, page_id: &PageId) -> StorageResult<&mut [u8]> {
        match self.page_table.get(page_id) {
            Some(&frame_id) => self.replacer.record_access(frame_id),
            None => self.load(page_id)?,
        }
        let (_, frame) = self.resident_mut(page_id)?;
        Ok(&mut frame.data[..])
    }

    pub fn mark_dirty(&mut self, page_id: &PageId) -> StorageResult<()> {
        let (_, frame) = self.resident_mut(page_id)?;
        frame.is_dirty = true;
        Ok(())
    }

    pub fn is_dirty(&self, page_id: &PageId) -> StorageResult<bool> {
        let (_, frame) = self.resident(page_id)?;
        Ok(frame.is_dirty)
    }

    pub fn contains(&self, page_id: &PageId) -> bool {
        self.page_table.contains_key(page_id)
    }

    /// Write `page_id` back if dirty and clear its dirty flag.
    pub fn flush_page(&mut self, page_id: &PageId) -> StorageResult<()> {
        let (_, frame) = self.resident_mut(page_id)?;
        frame.flush()
    }

    /// Flush every resident dirty page of `file`. A file with no resident pages is a no-op.
    pub fn flush_file(&mut self, file: &str) -> StorageResult<()> {
        for page_id in self.resident_pages(file) {
            self.flush_page(&page_id)?;
        }
        Ok(())
    }

    /// Flush every resident dirty page. A failed write-back does not stop the others;
    /// each failure is logged and the first one is returned.
    pub fn flush_all(&mut self) -> StorageResult<()> {
        let mut first_error = None;
        for frame in self.frames.iter_mut().flatten() {
            if let Err(e) = frame.flush() {
                warn!("Failed to flush page {}: {}", frame.page_id, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drop `page_id` from the pool without writing it back, dirty or not.
    pub fn discard_page(&mut self, page_id: &PageId) -> StorageResult<()> {
        let (frame_id, frame) = self.resident(page_id)?;
        if frame.is_dirty {
            debug!("Discarding dirty page {}", page_id);
        }
        self.clear_frame(frame_id);
        self.free_frames.push(frame_id);
        Ok(())
    }

    /// Discard every resident page of `file` without writing anything back.
    /// Unflushed changes are lost: call `flush_file` first to keep them.
    pub fn discard_file(&mut self, file: &str) -> StorageResult<()> {
        for page_id in self.resident_pages(file) {
            self.discard_page(&page_id)?;
        }
        Ok(())
    }

    /// Number of resident pages.
    pub fn len(&self) -> usize {
        self.page_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page_table.is_empty()
    }

    /// Maximum number of resident pages.
    pub fn capacity(&self) -> usize {
        self.max_frames
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn load(&mut self, page_id: &PageId) -> StorageResult<()> {
        let store = self.catalog.get(&page_id.file)?;
        if store.page_size() != self.page_size {
            return Err(StorageError::PageSizeMismatch {
                expected: self.page_size,
                actual: store.page_size(),
            });
        }

        // Read before making room so a failed read leaves the pool untouched.
        let mut data = vec![0u8; self.page_size].into_boxed_slice();
        store.read_page(page_id.page, &mut data)?;

        let frame_id = self.get_frame()?;
        debug!("Loaded page {} into frame {}", page_id, frame_id);
        self.frames[frame_id] = Some(Frame {
            page_id: page_id.clone(),
            data,
            is_dirty: false,
            store,
        });
        self.page_table.insert(page_id.clone(), frame_id);
        self.replacer.record_access(frame_id);
        Ok(())
    }

    fn get_frame(&mut self) -> StorageResult<FrameId> {
        if let Some(frame_id) = self.free_frames.pop() {
            return Ok(frame_id);
        }

        // Allocate new frame if under limit
        if self.frames.len() < self.max_frames {
            self.frames.push(None);
            return Ok(self.frames.len() - 1);
        }

        // Every occupied frame is tracked, and a full pool has no free frames.
        let Some(victim) = self.replacer.victim() else {
            unreachable!("full buffer pool with no tracked frame");
        };
        if let Some(frame) = self.frames[victim].as_mut() {
            debug!("Evicting page {} from frame {}", frame.page_id, victim);
            frame.flush()?;
        }

        self.clear_frame(victim);
        Ok(victim)
    }

    fn clear_frame(&mut self, frame_id: FrameId) {
        if let Some(frame) = self.frames[frame_id].take() {
            self.page_table.remove(&frame.page_id);
        }
        self.replacer.remove(frame_id);
    }

    fn resident_pages(&self, file: &str) -> Vec<PageId> {
        self.page_table
            .keys()
            .filter(|page_id| page_id.file == file)
            .cloned()
            .collect()
    }

    fn resident(&self, page_id: &PageId) -> StorageResult<(FrameId, &Frame)> {
        let not_resident = || StorageError::NotResident(page_id.clone());
        let frame_id = *self.page_table.get(page_id).ok_or_else(not_resident)?;
        let frame = self
            .frames
            .get(frame_id)
            .and_then(Option::as_ref)
            .ok_or_else(not_resident)?;
        Ok((frame_id, frame))
    }

    fn resident_mut(&mut self, page_id: &PageId) -> StorageResult<(FrameId, &mut Frame)> {
        let not_resident = || StorageError::NotResident(page_id.clone());
        let frame_id = *self.page_table.get(page_id).ok_or_else(not_resident)?;
        let frame = self
            .frames
            .get_mut(frame_id)
            .and_then(Option::as_mut)
            .ok_or_else(not_resident)?;
        Ok((frame_id, frame))
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        if let Err(e) = self.flush_all() {
            warn!("Failed to flush buffer pool on shutdown: {}", e);
        }
    }
}
