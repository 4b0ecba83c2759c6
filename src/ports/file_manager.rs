//! File manager port: the capability set plugins use to reach files.

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::FsError;
use crate::path::{FileKind, Location};

/// Metadata for one listed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Canonical (or, for disk-backed managers, display) path.
    pub path: String,
    /// Kind inferred from the name.
    pub kind: FileKind,
    /// Last publish time.
    pub last_modified: DateTime<Utc>,
}

/// Consistent snapshot of a file's contents.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Path the snapshot was read from.
    pub path: String,
    /// Kind inferred from the name.
    pub kind: FileKind,
    /// Bytes as of the moment the file was opened.
    pub contents: Arc<[u8]>,
    /// Last publish time.
    pub last_modified: DateTime<Utc>,
}

impl InputFile {
    /// Decodes the snapshot as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}

/// A single-writer output handle.
///
/// Bytes written are buffered until [`OutputSink::flush_contents`] or
/// [`OutputSink::close`] publishes them.
pub trait OutputSink: Write + Send {
    /// Path of the file being written.
    fn path(&self) -> &str;

    /// Publishes the buffered bytes without releasing the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the target was removed or the handle is closed.
    fn flush_contents(&mut self) -> Result<(), FsError>;

    /// Publishes the buffered bytes and releases the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the target was removed or the handle is closed.
    fn close(&mut self) -> Result<(), FsError>;
}

/// Resolves, lists, opens, and deletes files by location.
///
/// Implemented by the in-memory store, by a pass-through adapter over real
/// directories, and by a layered manager that consults the store first.
pub trait FileManager: Send + Sync {
    /// Returns `true` if this manager has authority over `location`.
    fn handles(&self, location: &Location) -> bool;

    /// Returns the path a package-relative name resolves to.
    fn resolve(&self, location: &Location, package: &str, name: &str) -> String;

    /// Lists files in `package`, optionally including sub-packages.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store is unavailable.
    fn list(
        &self,
        location: &Location,
        package: &str,
        kinds: &[FileKind],
        recurse: bool,
    ) -> Result<Vec<FileEntry>, FsError>;

    /// Opens a snapshot of an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] if no live file exists.
    fn open_input(&self, location: &Location, package: &str, name: &str)
        -> Result<InputFile, FsError>;

    /// Opens a file for writing, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if `location` does not accept output, or the file is
    /// read-only or already being written.
    fn open_output(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<Box<dyn OutputSink>, FsError>;

    /// Deletes a file. Returns `false` if nothing was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is read-only or the store is closed.
    fn delete(&self, location: &Location, package: &str, name: &str) -> Result<bool, FsError>;
}
