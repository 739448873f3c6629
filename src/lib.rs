//! pagepool - the in-memory page cache of a disk-backed storage engine
//!
//! This crate mediates all access between higher-level database code and
//! the on-disk page file: it pins a bounded set of fixed-size pages in
//! memory, picks eviction victims when demand exceeds capacity, and
//! indexes resident pages for expected-constant-time lookup by id.
//!
//! # Architecture
//!
//! - **Buffer Pool** (`buffer`): memory management for database pages
//!   - `BufferPoolManager`: owns the frame array, allocates page ids,
//!     pins/unpins pages, and serializes access to the disk
//!   - `LruKReplacer`: LRU-K eviction policy ranking frames by the
//!     recency of their K-th-most-recent access
//!   - `Page`: a page frame - 4 KiB buffer plus pin/dirty metadata
//!
//! - **Containers** (`container`): `ExtendibleHashTable`, the growing
//!   hash index the pool uses as its page table
//!
//! - **Storage** (`storage`): the disk collaborators
//!   - `DiskManager`: reads and writes pages in a single database file
//!   - `DiskScheduler`: background worker serializing page I/O
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pagepool::buffer::BufferPoolManager;
//! use pagepool::storage::disk::DiskManager;
//!
//! let disk_manager = Arc::new(DiskManager::new("test.db").unwrap());
//!
//! // 100 frames, LRU-2 eviction
//! let bpm = BufferPoolManager::new(100, 2, disk_manager);
//!
//! let (page_id, page) = bpm.new_page().unwrap().expect("pool full");
//! page.write_data()[..5].copy_from_slice(b"hello");
//!
//! // Report the modification and release the pin.
//! bpm.unpin_page(page_id, true);
//! bpm.flush_page(page_id).unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod container;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{FrameId, PageId, PoolError, Result, INVALID_PAGE_ID, PAGE_SIZE};
