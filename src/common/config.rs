/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Invalid page ID constant
pub const INVALID_PAGE_ID: PageId = PageId(-1);

/// Default number of frames in the buffer pool
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Default K value for the LRU-K replacement policy
pub const DEFAULT_REPLACER_K: usize = 2;

/// Default capacity of an extendible hash table bucket
pub const DEFAULT_BUCKET_SIZE: usize = 4;

use super::types::PageId;
