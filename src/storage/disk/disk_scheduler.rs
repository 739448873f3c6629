use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::common::{PageId, PoolError, Result, PAGE_SIZE};

use super::DiskManager;

type PageBuf = Box<[u8; PAGE_SIZE]>;

/// A disk I/O request queued for the background worker. Requests own their
/// buffers; results travel back on the per-request reply channel.
enum DiskRequest {
    Read {
        page_id: PageId,
        reply: Sender<Result<PageBuf>>,
    },
    Write {
        page_id: PageId,
        data: PageBuf,
        reply: Sender<Result<()>>,
    },
    Shutdown,
}

/// DiskScheduler funnels page I/O through a single background worker
/// thread. The `*_sync` entry points block until the worker has completed
/// the request, so callers get strictly serialized disk access without
/// holding the file lock themselves.
pub struct DiskScheduler {
    disk_manager: Arc<DiskManager>,
    request_sender: Sender<DiskRequest>,
    worker_handle: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    /// Creates a scheduler over the given disk manager and spawns its
    /// worker thread.
    pub fn new(disk_manager: Arc<DiskManager>) -> Self {
        let (sender, receiver) = unbounded::<DiskRequest>();

        let dm = Arc::clone(&disk_manager);
        let worker_handle = thread::spawn(move || Self::run_worker(dm, receiver));

        Self {
            disk_manager,
            request_sender: sender,
            worker_handle: Some(worker_handle),
        }
    }

    /// Reads one page, blocking until the worker completes it.
    pub fn schedule_read_sync(&self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE);

        let (reply, done) = bounded(1);
        self.submit(DiskRequest::Read { page_id, reply })?;

        let buf = Self::await_reply(done)??;
        data.copy_from_slice(&buf[..]);
        Ok(())
    }

    /// Writes one page, blocking until the worker completes it.
    pub fn schedule_write_sync(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE);

        let mut buf: PageBuf = Box::new([0u8; PAGE_SIZE]);
        buf.copy_from_slice(data);

        let (reply, done) = bounded(1);
        self.submit(DiskRequest::Write {
            page_id,
            data: buf,
            reply,
        })?;

        Self::await_reply(done)?
    }

    /// Returns the underlying disk manager.
    pub fn disk_manager(&self) -> &Arc<DiskManager> {
        &self.disk_manager
    }

    fn submit(&self, request: DiskRequest) -> Result<()> {
        self.request_sender
            .send(request)
            .map_err(|_| PoolError::DiskScheduler("worker thread is gone".into()))
    }

    fn await_reply<T>(done: Receiver<Result<T>>) -> Result<Result<T>> {
        done.recv()
            .map_err(|_| PoolError::DiskScheduler("worker dropped the request".into()))
    }

    fn run_worker(disk_manager: Arc<DiskManager>, receiver: Receiver<DiskRequest>) {
        while let Ok(request) = receiver.recv() {
            match request {
                DiskRequest::Read { page_id, reply } => {
                    let mut buf: PageBuf = Box::new([0u8; PAGE_SIZE]);
                    let result = disk_manager
                        .read_page(page_id, &mut buf[..])
                        .map(|_| buf);
                    let _ = reply.send(result);
                }
                DiskRequest::Write {
                    page_id,
                    data,
                    reply,
                } => {
                    let _ = reply.send(disk_manager.write_page(page_id, &data[..]));
                }
                DiskRequest::Shutdown => break,
            }
        }
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        let _ = self.request_sender.send(DiskRequest::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}
