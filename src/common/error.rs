use thiserror::Error;

use super::types::PageId;

/// Errors surfaced by the page cache.
///
/// Capacity exhaustion and caller contract violations are not errors; they
/// are reported as absent values and booleans by the buffer pool API. An
/// `Err` here means disk I/O or scheduler plumbing failed.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),

    #[error("Disk scheduler error: {0}")]
    DiskScheduler(String),
}

pub type Result<T> = std::result::Result<T, PoolError>;
