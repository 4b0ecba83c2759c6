//! A single in-memory file.

use std::io::{Cursor, Read};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::stream::{FileStream, SharedBuffer};
use crate::error::FsError;
use crate::path::{FileKind, Location};
use crate::ports::clock::Clock;

/// Bookkeeping for the one stream allowed to write a file.
struct WriterSlot {
    id: u64,
    buffer: Weak<SharedBuffer>,
}

struct FileState {
    contents: Arc<[u8]>,
    last_modified: DateTime<Utc>,
    deleted: bool,
    writer: Option<WriterSlot>,
}

/// An in-memory file keyed by canonical path.
///
/// Contents are an immutable buffer that is swapped wholesale when a stream
/// publishes, so a reader holding an earlier snapshot never observes a
/// partial write.
pub struct VirtualFile {
    path: String,
    location: Location,
    kind: FileKind,
    read_only: bool,
    clock: Arc<dyn Clock>,
    state: Mutex<FileState>,
}

impl VirtualFile {
    pub(crate) fn new(
        path: String,
        location: Location,
        read_only: bool,
        contents: Arc<[u8]>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let kind = FileKind::from_name(&path);
        let last_modified = clock.now();
        Self {
            path,
            location,
            kind,
            read_only,
            clock,
            state: Mutex::new(FileState { contents, last_modified, deleted: false, writer: None }),
        }
    }

    /// Canonical path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Location the file lives in.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Kind inferred from the name.
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// `true` if the file was seeded read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// `true` once the file has been deleted or its store reset.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.state.lock().deleted
    }

    /// Time of the last publish (or creation).
    #[must_use]
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.state.lock().last_modified
    }

    /// Snapshot of the current contents.
    #[must_use]
    pub fn contents(&self) -> Arc<[u8]> {
        Arc::clone(&self.state.lock().contents)
    }

    /// Current contents decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// Opens a reader over the contents as of this call.
    #[must_use]
    pub fn open_read(&self) -> FileReader {
        FileReader { path: self.path.clone(), cursor: Cursor::new(self.contents()) }
    }

    /// `true` while a stream holds the write lock.
    #[must_use]
    pub fn is_open_for_write(&self) -> bool {
        self.state.lock().writer.is_some()
    }

    /// Opens the single write stream for this file.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::ReadOnly`] for read-only files,
    /// [`FsError::AlreadyOpenForWriting`] if another stream is live, and
    /// [`FsError::FileRemoved`] if the file was deleted.
    pub fn open_for_write(self: &Arc<Self>) -> Result<FileStream, FsError> {
        let mut state = self.state.lock();
        if state.deleted {
            return Err(FsError::FileRemoved { path: self.path.clone() });
        }
        if self.read_only {
            return Err(FsError::ReadOnly { path: self.path.clone() });
        }
        if state.writer.as_ref().is_some_and(|slot| slot.buffer.strong_count() > 0) {
            return Err(FsError::AlreadyOpenForWriting { path: self.path.clone() });
        }
        let stream = FileStream::new(Arc::clone(self));
        state.writer = Some(WriterSlot { id: stream.id(), buffer: stream.shared_buffer() });
        tracing::debug!(path = %self.path, stream = stream.id(), "opened for write");
        Ok(stream)
    }

    /// Fails unless `id` still owns the write lock on a live file.
    pub(crate) fn check_writer(&self, id: u64) -> Result<(), FsError> {
        let state = self.state.lock();
        if state.deleted || !state.writer.as_ref().is_some_and(|slot| slot.id == id) {
            return Err(FsError::FileRemoved { path: self.path.clone() });
        }
        Ok(())
    }

    /// Swaps in `contents` on behalf of stream `id`.
    pub(crate) fn publish(&self, id: u64, contents: Arc<[u8]>) -> Result<(), FsError> {
        let mut state = self.state.lock();
        if state.deleted || !state.writer.as_ref().is_some_and(|slot| slot.id == id) {
            return Err(FsError::FileRemoved { path: self.path.clone() });
        }
        state.contents = contents;
        state.last_modified = self.clock.now();
        Ok(())
    }

    /// Drops the write lock if stream `id` still holds it.
    pub(crate) fn release(&self, id: u64) {
        let mut state = self.state.lock();
        if state.writer.as_ref().is_some_and(|slot| slot.id == id) {
            state.writer = None;
        }
    }

    /// Marks the file deleted, invalidating any open stream.
    pub(crate) fn mark_deleted(&self) {
        let mut state = self.state.lock();
        state.deleted = true;
        state.writer = None;
    }

    /// Id and buffer of the live writer, if any.
    pub(crate) fn live_writer(&self) -> Option<(u64, Arc<SharedBuffer>)> {
        let state = self.state.lock();
        let slot = state.writer.as_ref()?;
        slot.buffer.upgrade().map(|buffer| (slot.id, buffer))
    }
}

impl std::fmt::Debug for VirtualFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFile")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("read_only", &self.read_only)
            .field("deleted", &self.is_deleted())
            .finish_non_exhaustive()
    }
}

/// Reader over a fixed snapshot of a file's contents.
#[derive(Debug)]
pub struct FileReader {
    path: String,
    cursor: Cursor<Arc<[u8]>>,
}

impl FileReader {
    /// Path of the file the snapshot came from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}
