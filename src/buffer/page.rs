use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use parking_lot::RwLock;

use crate::common::{FrameId, PageId, INVALID_PAGE_ID, PAGE_SIZE};

/// A page frame in the buffer pool: a fixed-size byte buffer plus the
/// metadata the pool tracks per frame.
///
/// Frames live for the lifetime of the pool and are handed to callers as
/// `Arc<Page>`. The data buffer sits behind its own reader/writer lock;
/// the metadata uses atomics so the pool can update it while a caller holds
/// a data guard. A frame is empty when `page_id` is the invalid sentinel,
/// the pin count is zero, and the dirty flag is clear.
pub struct Page {
    /// Index of this frame in the pool's frame array
    frame_id: FrameId,
    /// Raw id of the resident page (INVALID_PAGE_ID when empty)
    page_id: AtomicI32,
    /// Number of callers currently pinning this frame
    pin_count: AtomicU32,
    /// Whether the in-memory contents differ from disk
    is_dirty: AtomicBool,
    /// The page contents
    data: RwLock<Box<[u8; PAGE_SIZE]>>,
}

impl Page {
    pub(crate) fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: AtomicI32::new(INVALID_PAGE_ID.as_i32()),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
            data: RwLock::new(Box::new([0u8; PAGE_SIZE])),
        }
    }

    /// Returns the frame index this page occupies.
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the id of the resident page.
    pub fn page_id(&self) -> PageId {
        PageId::new(self.page_id.load(Ordering::Acquire))
    }

    pub(crate) fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id.as_i32(), Ordering::Release);
    }

    /// Returns the current pin count.
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and returns the new value.
    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value, or None if the
    /// count was already zero.
    pub(crate) fn unpin(&self) -> Option<u32> {
        loop {
            let current = self.pin_count.load(Ordering::Acquire);
            if current == 0 {
                return None;
            }
            if self
                .pin_count
                .compare_exchange(current, current - 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Some(current - 1);
            }
        }
    }

    /// Returns whether the page has been modified since it was last
    /// written to disk.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.is_dirty.store(dirty, Ordering::Release);
    }

    /// Returns a read guard over the page contents.
    pub fn read_data(&self) -> parking_lot::RwLockReadGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.data.read()
    }

    /// Returns a write guard over the page contents.
    ///
    /// Writers must report the modification through
    /// `BufferPoolManager::unpin_page(.., true)` so the frame is written
    /// back before reuse.
    pub fn write_data(&self) -> parking_lot::RwLockWriteGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.data.write()
    }

    pub(crate) fn copy_from(&self, data: &[u8]) {
        assert_eq!(data.len(), PAGE_SIZE);
        self.data.write().copy_from_slice(data);
    }

    pub(crate) fn copy_to(&self, data: &mut [u8]) {
        assert_eq!(data.len(), PAGE_SIZE);
        data.copy_from_slice(&**self.data.read());
    }

    /// Zeroes the page contents.
    pub(crate) fn reset_memory(&self) {
        self.data.write().fill(0);
    }

    /// Resets the frame to its empty state.
    pub(crate) fn reset(&self) {
        self.page_id
            .store(INVALID_PAGE_ID.as_i32(), Ordering::Release);
        self.pin_count.store(0, Ordering::Release);
        self.is_dirty.store(false, Ordering::Release);
        self.reset_memory();
    }
}
