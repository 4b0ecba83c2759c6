//! Single-writer output stream bound to one [`VirtualFile`].

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::file::VirtualFile;
use crate::error::FsError;
use crate::ports::file_manager::OutputSink;

/// Write buffer shared between a stream and its file's writer slot.
pub(crate) type SharedBuffer = Mutex<Vec<u8>>;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Buffers writes for one file and publishes them on flush or close.
///
/// Dropping an unclosed stream closes it. Writes after the file is deleted
/// fail with [`FsError::FileRemoved`].
pub struct FileStream {
    file: Arc<VirtualFile>,
    id: u64,
    buffer: Arc<SharedBuffer>,
    closed: bool,
}

impl FileStream {
    pub(crate) fn new(file: Arc<VirtualFile>) -> Self {
        Self {
            file,
            id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            buffer: Arc::new(Mutex::new(Vec::new())),
            closed: false,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn shared_buffer(&self) -> std::sync::Weak<SharedBuffer> {
        Arc::downgrade(&self.buffer)
    }

    /// The file this stream writes.
    #[must_use]
    pub fn file(&self) -> &Arc<VirtualFile> {
        &self.file
    }

    /// `true` once closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), FsError> {
        if self.closed {
            return Err(FsError::StreamClosed { path: self.file.path().to_string() });
        }
        Ok(())
    }

    /// Appends bytes to the private buffer.
    ///
    /// # Errors
    ///
    /// Fails if the stream is closed or its file was removed.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), FsError> {
        self.ensure_open()?;
        self.file.check_writer(self.id)?;
        self.buffer.lock().extend_from_slice(bytes);
        Ok(())
    }

    /// Publishes everything written so far.
    ///
    /// # Errors
    ///
    /// Fails if the stream is closed or its file was removed.
    pub fn publish(&mut self) -> Result<(), FsError> {
        self.ensure_open()?;
        publish_buffer(&self.file, self.id, &self.buffer)
    }

    /// Publishes and releases the write lock. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Fails if the file was removed; the stream is closed regardless.
    pub fn close(&mut self) -> Result<(), FsError> {
        if self.closed {
            return Ok(());
        }
        let published = publish_buffer(&self.file, self.id, &self.buffer);
        self.file.release(self.id);
        self.closed = true;
        tracing::debug!(path = %self.file.path(), stream = self.id, "stream closed");
        published
    }
}

/// Copies the buffer into a fresh immutable snapshot and swaps it in.
pub(crate) fn publish_buffer(
    file: &VirtualFile,
    id: u64,
    buffer: &SharedBuffer,
) -> Result<(), FsError> {
    let snapshot: Arc<[u8]> = Arc::from(buffer.lock().as_slice());
    file.publish(id, snapshot)
}

fn to_io(err: FsError) -> std::io::Error {
    std::io::Error::other(err)
}

impl Write for FileStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.write_bytes(buf).map_err(to_io)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.publish().map_err(to_io)
    }
}

impl OutputSink for FileStream {
    fn path(&self) -> &str {
        self.file.path()
    }

    fn flush_contents(&mut self) -> Result<(), FsError> {
        self.publish()
    }

    fn close(&mut self) -> Result<(), FsError> {
        FileStream::close(self)
    }
}

impl Drop for FileStream {
    fn drop(&mut self) {
        if let Err(err) = FileStream::close(self) {
            tracing::debug!(
                path = %self.file.path(),
                error = %err,
                "stream dropped without publishing"
            );
        }
    }
}

impl std::fmt::Debug for FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("path", &self.file.path())
            .field("id", &self.id)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
