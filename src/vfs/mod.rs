//! In-memory file store shared by the test thread and the compiler.
//!
//! Every map operation runs under one store-wide lock; content swaps use the
//! per-file lock nested inside it. Neither lock is held while user code or
//! disk I/O runs.

pub mod file;
pub mod layered;
pub mod stream;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

pub use file::{FileReader, VirtualFile};
pub use layered::LayeredFileManager;
pub use stream::FileStream;

use crate::adapters::live::clock::LiveClock;
use crate::error::FsError;
use crate::path::{self, FileKind, Location};
use crate::ports::clock::Clock;
use crate::ports::file_manager::{FileEntry, FileManager, InputFile, OutputSink};

#[derive(Default)]
struct StoreState {
    files: BTreeMap<String, Arc<VirtualFile>>,
    closed: bool,
}

/// Path-indexed store of [`VirtualFile`]s.
pub struct VirtualFileSystem {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl Default for VirtualFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem {
    /// Creates an empty store stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(LiveClock))
    }

    /// Creates an empty store stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { state: Mutex::new(StoreState::default()), clock }
    }

    /// Locations the store has authority over.
    #[must_use]
    pub fn owns(location: &Location) -> bool {
        matches!(location, Location::Source) || location.is_output()
    }

    /// Canonical path for a package-relative name.
    #[must_use]
    pub fn resolve(&self, location: &Location, package: &str, name: &str) -> String {
        path::canonical_path(location, package, name)
    }

    /// Canonical path for a qualified class name and kind.
    #[must_use]
    pub fn resolve_class(&self, location: &Location, class_name: &str, kind: FileKind) -> String {
        path::canonical_class_path(location, class_name, kind)
    }

    /// Live files in `package` whose kind is in `kinds`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::ClosedFileSystem`] after [`close`](Self::close).
    pub fn list(
        &self,
        location: &Location,
        package: &str,
        kinds: &[FileKind],
        recurse: bool,
    ) -> Result<Vec<Arc<VirtualFile>>, FsError> {
        let prefix = path::package_prefix(location, package);
        let state = self.open_state()?;
        Ok(state
            .files
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| recurse || !key[prefix.len()..].contains('/'))
            .filter(|(_, file)| kinds.contains(&file.kind()) && !file.is_deleted())
            .map(|(_, file)| Arc::clone(file))
            .collect())
    }

    /// Looks up a live file by canonical path.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] if no live file is there.
    pub fn get(&self, canonical: &str) -> Result<Arc<VirtualFile>, FsError> {
        let key = path::canonicalize(canonical);
        let state = self.open_state()?;
        state
            .files
            .get(&key)
            .filter(|file| !file.is_deleted())
            .cloned()
            .ok_or(FsError::NotFound { path: key })
    }

    /// Looks up an existing file by package and name.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] if no live file is there.
    pub fn get_for_input(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<Arc<VirtualFile>, FsError> {
        self.get(&self.resolve(location, package, name))
    }

    /// Looks up an existing file by class name and kind.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] if no live file is there.
    pub fn get_class_for_input(
        &self,
        location: &Location,
        class_name: &str,
        kind: FileKind,
    ) -> Result<Arc<VirtualFile>, FsError> {
        self.get(&self.resolve_class(location, class_name, kind))
    }

    /// Returns the output file at package and name, creating it if absent.
    ///
    /// A path whose file was deleted may be created again.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::InvalidOutputLocation`] if `location` is not an
    /// output location.
    pub fn get_for_output(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<Arc<VirtualFile>, FsError> {
        let canonical = self.resolve(location, package, name);
        self.output_at(location, canonical)
    }

    /// Returns the output file for a class name and kind, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::InvalidOutputLocation`] if `location` is not an
    /// output location.
    pub fn get_class_for_output(
        &self,
        location: &Location,
        class_name: &str,
        kind: FileKind,
    ) -> Result<Arc<VirtualFile>, FsError> {
        let canonical = self.resolve_class(location, class_name, kind);
        self.output_at(location, canonical)
    }

    fn output_at(
        &self,
        location: &Location,
        canonical: String,
    ) -> Result<Arc<VirtualFile>, FsError> {
        if !location.is_output() {
            return Err(FsError::InvalidOutputLocation { location: location.name().to_string() });
        }
        let mut state = self.open_state()?;
        if let Some(existing) = state.files.get(&canonical).filter(|f| !f.is_deleted()) {
            return Ok(Arc::clone(existing));
        }
        tracing::debug!(path = %canonical, "creating output file");
        let file = Arc::new(VirtualFile::new(
            canonical.clone(),
            location.clone(),
            false,
            Arc::from(&[][..]),
            Arc::clone(&self.clock),
        ));
        state.files.insert(canonical, Arc::clone(&file));
        Ok(file)
    }

    /// Seeds a writable file, replacing any file at the same path.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::ClosedFileSystem`] after [`close`](Self::close).
    pub fn seed(
        &self,
        location: &Location,
        package: &str,
        name: &str,
        contents: impl AsRef<[u8]>,
    ) -> Result<Arc<VirtualFile>, FsError> {
        self.insert_seed(location, package, name, contents.as_ref(), false)
    }

    /// Seeds a read-only file, replacing any file at the same path.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::ClosedFileSystem`] after [`close`](Self::close).
    pub fn seed_read_only(
        &self,
        location: &Location,
        package: &str,
        name: &str,
        contents: impl AsRef<[u8]>,
    ) -> Result<Arc<VirtualFile>, FsError> {
        self.insert_seed(location, package, name, contents.as_ref(), true)
    }

    fn insert_seed(
        &self,
        location: &Location,
        package: &str,
        name: &str,
        contents: &[u8],
        read_only: bool,
    ) -> Result<Arc<VirtualFile>, FsError> {
        let canonical = self.resolve(location, package, name);
        let file = Arc::new(VirtualFile::new(
            canonical.clone(),
            location.clone(),
            read_only,
            Arc::from(contents),
            Arc::clone(&self.clock),
        ));
        let mut state = self.open_state()?;
        if let Some(previous) = state.files.insert(canonical.clone(), Arc::clone(&file)) {
            previous.mark_deleted();
        }
        tracing::debug!(path = %canonical, read_only, bytes = contents.len(), "seeded file");
        Ok(file)
    }

    /// Deletes the file at a canonical path. Returns `false` if nothing live
    /// was there.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::ReadOnly`] for read-only files.
    pub fn delete(&self, canonical: &str) -> Result<bool, FsError> {
        let key = path::canonicalize(canonical);
        let state = self.open_state()?;
        let Some(file) = state.files.get(&key).filter(|f| !f.is_deleted()) else {
            return Ok(false);
        };
        if file.is_read_only() {
            return Err(FsError::ReadOnly { path: key });
        }
        file.mark_deleted();
        tracing::debug!(path = %key, "deleted file");
        Ok(true)
    }

    /// Canonical paths of every live file.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::ClosedFileSystem`] after [`close`](Self::close).
    pub fn paths(&self) -> Result<Vec<String>, FsError> {
        let state = self.open_state()?;
        Ok(state.files.iter().filter(|(_, f)| !f.is_deleted()).map(|(k, _)| k.clone()).collect())
    }

    /// Canonical paths of files with a live write stream.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::ClosedFileSystem`] after [`close`](Self::close).
    pub fn open_writers(&self) -> Result<Vec<String>, FsError> {
        let state = self.open_state()?;
        Ok(state
            .files
            .values()
            .filter(|f| f.is_open_for_write())
            .map(|f| f.path().to_string())
            .collect())
    }

    /// Publishes the buffer of every live stream without closing it.
    ///
    /// Failures are logged and skipped so one bad stream cannot block the
    /// rest. Returns the number of streams published.
    pub fn flush_open_streams(&self) -> usize {
        let files: Vec<Arc<VirtualFile>> = match self.open_state() {
            Ok(state) => state.files.values().cloned().collect(),
            Err(_) => return 0,
        };
        let mut flushed = 0;
        for file in files {
            let Some((id, buffer)) = file.live_writer() else {
                continue;
            };
            match stream::publish_buffer(&file, id, &buffer) {
                Ok(()) => flushed += 1,
                Err(err) => {
                    tracing::warn!(
                        path = %file.path(),
                        error = %err,
                        "failed to flush open stream"
                    );
                }
            }
        }
        flushed
    }

    /// Drops every file and invalidates every open stream.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::ClosedFileSystem`] after [`close`](Self::close).
    pub fn reset(&self) -> Result<(), FsError> {
        let mut state = self.open_state()?;
        Self::purge(&mut state);
        Ok(())
    }

    /// Resets, then permanently disables the store. Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        Self::purge(&mut state);
        state.closed = true;
        tracing::debug!("file system closed");
    }

    /// `true` after [`close`](Self::close).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn purge(state: &mut StoreState) {
        for file in state.files.values() {
            file.mark_deleted();
        }
        let purged = state.files.len();
        state.files.clear();
        tracing::debug!(purged, "file system reset");
    }

    fn open_state(&self) -> Result<parking_lot::MutexGuard<'_, StoreState>, FsError> {
        let state = self.state.lock();
        if state.closed {
            return Err(FsError::ClosedFileSystem);
        }
        Ok(state)
    }
}

fn entry(file: &VirtualFile) -> FileEntry {
    FileEntry {
        path: file.path().to_string(),
        kind: file.kind(),
        last_modified: file.last_modified(),
    }
}

impl FileManager for VirtualFileSystem {
    fn handles(&self, location: &Location) -> bool {
        Self::owns(location)
    }

    fn resolve(&self, location: &Location, package: &str, name: &str) -> String {
        VirtualFileSystem::resolve(self, location, package, name)
    }

    fn list(
        &self,
        location: &Location,
        package: &str,
        kinds: &[FileKind],
        recurse: bool,
    ) -> Result<Vec<FileEntry>, FsError> {
        Ok(VirtualFileSystem::list(self, location, package, kinds, recurse)?
            .iter()
            .map(|f| entry(f))
            .collect())
    }

    fn open_input(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<InputFile, FsError> {
        let file = self.get_for_input(location, package, name)?;
        Ok(InputFile {
            path: file.path().to_string(),
            kind: file.kind(),
            contents: file.contents(),
            last_modified: file.last_modified(),
        })
    }

    fn open_output(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<Box<dyn OutputSink>, FsError> {
        let file = self.get_for_output(location, package, name)?;
        Ok(Box::new(file.open_for_write()?))
    }

    fn delete(&self, location: &Location, package: &str, name: &str) -> Result<bool, FsError> {
        VirtualFileSystem::delete(self, &VirtualFileSystem::resolve(self, location, package, name))
    }
}

impl std::fmt::Debug for VirtualFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VirtualFileSystem")
            .field("files", &state.files.len())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}
