use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::common::{PageId, PoolError, Result, PAGE_SIZE};

/// DiskManager reads and writes fixed-size pages to a single database file.
///
/// Page `n` lives at byte offset `n * PAGE_SIZE`; the file grows on the
/// first write past its end. Reads past the end (a page that was allocated
/// but never written) come back zeroed, matching a freshly zeroed frame.
pub struct DiskManager {
    file: Mutex<File>,
    /// Number of page reads served
    num_reads: AtomicU64,
    /// Number of page writes performed
    num_writes: AtomicU64,
}

impl DiskManager {
    /// Opens (creating if needed) the database file at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(db_path)?;

        Ok(Self {
            file: Mutex::new(file),
            num_reads: AtomicU64::new(0),
            num_writes: AtomicU64::new(0),
        })
    }

    /// Reads one page into the provided buffer, zero-filling anything past
    /// the end of the file.
    pub fn read_page(&self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE, "buffer must be PAGE_SIZE bytes");
        let offset = Self::byte_offset(page_id)?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < PAGE_SIZE {
            let n = file.read(&mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        data[filled..].fill(0);

        self.num_reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Writes one page from the provided buffer.
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE, "buffer must be PAGE_SIZE bytes");
        let offset = Self::byte_offset(page_id)?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Releases a page's backing storage. Advisory: the file is not
    /// shrunk, and the offset may be rewritten by a future page.
    pub fn deallocate_page(&self, page_id: PageId) {
        debug!(%page_id, "page deallocated");
    }

    /// Flushes file contents and metadata to the storage device.
    pub fn sync(&self) -> Result<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    pub fn get_num_reads(&self) -> u64 {
        self.num_reads.load(Ordering::Relaxed)
    }

    pub fn get_num_writes(&self) -> u64 {
        self.num_writes.load(Ordering::Relaxed)
    }

    fn byte_offset(page_id: PageId) -> Result<u64> {
        if !page_id.is_valid() {
            return Err(PoolError::InvalidPageId(page_id));
        }
        Ok(page_id.as_i32() as u64 * PAGE_SIZE as u64)
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        let _ = self.file.get_mut().sync_all();
    }
}
