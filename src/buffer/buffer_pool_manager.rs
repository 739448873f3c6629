use std::collections::LinkedList;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::common::{FrameId, PageId, Result, DEFAULT_BUCKET_SIZE, INVALID_PAGE_ID, PAGE_SIZE};
use crate::container::ExtendibleHashTable;
use crate::storage::disk::{DiskManager, DiskScheduler};

use super::{LruKReplacer, Page};

/// State guarded by the pool latch. The page table and replacer carry
/// their own latches, but every externally observable transition happens
/// while this one is held, so the invariants between them never tear.
struct PoolState {
    /// Frames that have never held a page, plus frames handed back by
    /// delete_page
    free_list: LinkedList<FrameId>,
    /// Source of fresh page ids, monotonic from 0
    next_page_id: i32,
}

/// BufferPoolManager mediates all access between database code and the
/// on-disk page file. It pins a bounded set of fixed-size pages in memory,
/// evicts by LRU-K when demand exceeds capacity, and indexes resident
/// pages in an extendible hash table for expected-O(1) lookup.
///
/// A fetched or newly created page stays resident while its pin count is
/// positive; callers release their claim with `unpin_page`, at which point
/// the frame becomes eligible for eviction and the returned `Arc<Page>`
/// must no longer be used to read page contents.
pub struct BufferPoolManager {
    /// Number of frames in the pool
    pool_size: usize,
    /// The frame array; lives for the lifetime of the manager
    frames: Vec<Arc<Page>>,
    /// Page table: resident page id -> frame id
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// Eviction policy over frames with pin count zero
    replacer: LruKReplacer,
    /// Serialized access to the backing file
    disk_scheduler: DiskScheduler,
    /// Pool latch, held for the full extent of every public operation
    latch: Mutex<PoolState>,
}

impl BufferPoolManager {
    /// Creates a pool with `pool_size` frames, LRU-`replacer_k` eviction,
    /// and the default page-table bucket capacity.
    pub fn new(pool_size: usize, replacer_k: usize, disk_manager: Arc<DiskManager>) -> Self {
        Self::with_bucket_size(pool_size, replacer_k, DEFAULT_BUCKET_SIZE, disk_manager)
    }

    /// Creates a pool with an explicit page-table bucket capacity.
    pub fn with_bucket_size(
        pool_size: usize,
        replacer_k: usize,
        bucket_size: usize,
        disk_manager: Arc<DiskManager>,
    ) -> Self {
        assert!(pool_size >= 1, "pool must have at least one frame");

        let frames = (0..pool_size)
            .map(|i| Arc::new(Page::new(FrameId::new(i))))
            .collect();
        let free_list = (0..pool_size).map(FrameId::new).collect();

        Self {
            pool_size,
            frames,
            page_table: ExtendibleHashTable::new(bucket_size),
            replacer: LruKReplacer::new(pool_size, replacer_k),
            disk_scheduler: DiskScheduler::new(disk_manager),
            latch: Mutex::new(PoolState {
                free_list,
                next_page_id: 0,
            }),
        }
    }

    /// Creates a fresh zeroed page, pinned, and returns its id with the
    /// frame. Returns `Ok(None)` when every frame is pinned.
    pub fn new_page(&self) -> Result<Option<(PageId, Arc<Page>)>> {
        let mut state = self.latch.lock();

        let frame_id = match self.acquire_frame(&mut state)? {
            Some(frame_id) => frame_id,
            None => return Ok(None),
        };

        let page_id = PageId::new(state.next_page_id);
        state.next_page_id += 1;

        let frame = &self.frames[frame_id.as_usize()];
        frame.reset_memory();
        frame.set_page_id(page_id);
        self.page_table.insert(page_id, frame_id);

        trace!(%page_id, %frame_id, "new page");
        Ok(Some((page_id, Arc::clone(frame))))
    }

    /// Fetches the page with the given id, pinning it. On a miss the page
    /// is read from disk into a free or evicted frame. Returns `Ok(None)`
    /// when the page is not resident and every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Result<Option<Arc<Page>>> {
        assert!(page_id.is_valid(), "fetch of {page_id}");
        let mut state = self.latch.lock();

        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.as_usize()];
            frame.pin();
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            return Ok(Some(Arc::clone(frame)));
        }

        let frame_id = match self.acquire_frame(&mut state)? {
            Some(frame_id) => frame_id,
            None => return Ok(None),
        };

        let frame = &self.frames[frame_id.as_usize()];
        {
            let mut data = frame.write_data();
            self.disk_scheduler
                .schedule_read_sync(page_id, &mut data[..])?;
        }
        frame.set_page_id(page_id);
        self.page_table.insert(page_id, frame_id);

        trace!(%page_id, %frame_id, "fetched from disk");
        Ok(Some(Arc::clone(frame)))
    }

    /// Releases one pin on the page and ORs `is_dirty` into its dirty
    /// flag. Returns false if the page is not resident or not pinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let _state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };

        let frame = &self.frames[frame_id.as_usize()];
        match frame.unpin() {
            None => false,
            Some(remaining) => {
                if remaining == 0 {
                    self.replacer.set_evictable(frame_id, true);
                }
                if is_dirty {
                    frame.set_dirty(true);
                }
                true
            }
        }
    }

    /// Writes the page to disk if it is dirty and clears its dirty flag.
    /// Pin state is untouched. Returns false if the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let _state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(false);
        };

        self.flush_frame(&self.frames[frame_id.as_usize()])?;
        Ok(true)
    }

    /// Writes every resident dirty page to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let _state = self.latch.lock();

        for frame in &self.frames {
            if frame.page_id() != INVALID_PAGE_ID {
                self.flush_frame(frame)?;
            }
        }
        Ok(())
    }

    /// Drops the page from the pool and releases its backing storage.
    /// Returns true if the page was not resident or was dropped, false if
    /// it is still pinned.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(true);
        };

        let frame = &self.frames[frame_id.as_usize()];
        if frame.pin_count() > 0 {
            return Ok(false);
        }

        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id);
        frame.reset();
        state.free_list.push_back(frame_id);
        self.disk_scheduler.disk_manager().deallocate_page(page_id);

        debug!(%page_id, %frame_id, "page deleted");
        Ok(true)
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the number of frames that have never held a page or were
    /// handed back by delete_page.
    pub fn free_frame_count(&self) -> usize {
        self.latch.lock().free_list.len()
    }

    /// Returns the number of resident frames with no pinners.
    pub fn evictable_frame_count(&self) -> usize {
        self.replacer.size()
    }

    /// Returns the pin count of a resident page, or None if the page is
    /// not in the pool.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let _state = self.latch.lock();
        self.page_table
            .find(&page_id)
            .map(|frame_id| self.frames[frame_id.as_usize()].pin_count())
    }

    /// Obtains a frame for a new or incoming page: the free list first,
    /// then an LRU-K victim (written back if dirty). The frame comes back
    /// pinned once, clean, tracked non-evictable, with an invalid page id.
    fn acquire_frame(&self, state: &mut PoolState) -> Result<Option<FrameId>> {
        let frame_id = match state.free_list.pop_front() {
            Some(frame_id) => frame_id,
            None => {
                let Some(frame_id) = self.replacer.evict() else {
                    return Ok(None);
                };
                let frame = &self.frames[frame_id.as_usize()];
                let victim_id = frame.page_id();

                debug!(page_id = %victim_id, %frame_id, dirty = frame.is_dirty(), "evicting");
                self.page_table.remove(&victim_id);
                self.flush_frame(frame)?;
                frame_id
            }
        };

        let frame = &self.frames[frame_id.as_usize()];
        self.replacer.record_access(frame_id);

        assert!(
            frame.pin_count() == 0 && !frame.is_dirty(),
            "acquired frame {frame_id} is in use"
        );
        frame.set_page_id(INVALID_PAGE_ID);
        frame.pin();
        Ok(Some(frame_id))
    }

    fn flush_frame(&self, frame: &Page) -> Result<()> {
        if !frame.is_dirty() {
            return Ok(());
        }

        let mut data = [0u8; PAGE_SIZE];
        frame.copy_to(&mut data);
        self.disk_scheduler
            .schedule_write_sync(frame.page_id(), &data)?;
        frame.set_dirty(false);

        trace!(page_id = %frame.page_id(), "wrote back");
        Ok(())
    }
}
