//! Pass-through file manager over real directories, using `std::fs`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::FsError;
use crate::path::{self, FileKind, Location};
use crate::ports::file_manager::{FileEntry, FileManager, InputFile, OutputSink};

/// Serves locations the in-memory store does not own from directories on
/// disk. Unmapped locations list as empty and open as not found.
#[derive(Debug, Default, Clone)]
pub struct PassThroughFileManager {
    roots: BTreeMap<Location, PathBuf>,
}

impl PassThroughFileManager {
    /// Creates a manager with no mapped locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `location` to the directory `root`.
    #[must_use]
    pub fn with_root(mut self, location: Location, root: impl AsRef<Path>) -> Self {
        self.roots.insert(location, root.as_ref().to_path_buf());
        self
    }

    fn disk_path(&self, location: &Location, package: &str, name: &str) -> Option<PathBuf> {
        let root = self.roots.get(location)?;
        let mut disk = root.clone();
        for segment in package.split('.').filter(|s| !s.is_empty()) {
            disk.push(segment);
        }
        for segment in name.split('/').filter(|s| !s.is_empty()) {
            disk.push(segment);
        }
        Some(disk)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> FsError {
    if source.kind() == std::io::ErrorKind::NotFound {
        FsError::NotFound { path: path.display().to_string() }
    } else {
        FsError::Io { path: path.to_path_buf(), source }
    }
}

fn modified(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_or_else(|_| Utc::now(), DateTime::<Utc>::from)
}

fn walk(
    dir: &Path,
    recurse: bool,
    kinds: &[FileKind],
    out: &mut Vec<FileEntry>,
) -> Result<(), FsError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(io_error(dir, err)),
    };
    for entry in entries {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            if recurse {
                walk(&path, recurse, kinds, out)?;
            }
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let kind = FileKind::from_name(&name);
        if kinds.contains(&kind) {
            out.push(FileEntry {
                path: path.display().to_string(),
                kind,
                last_modified: modified(&path),
            });
        }
    }
    Ok(())
}

impl FileManager for PassThroughFileManager {
    fn handles(&self, location: &Location) -> bool {
        self.roots.contains_key(location)
    }

    fn resolve(&self, location: &Location, package: &str, name: &str) -> String {
        self.disk_path(location, package, name)
            .map_or_else(
                || path::canonical_path(location, package, name),
                |p| p.display().to_string(),
            )
    }

    fn list(
        &self,
        location: &Location,
        package: &str,
        kinds: &[FileKind],
        recurse: bool,
    ) -> Result<Vec<FileEntry>, FsError> {
        let Some(dir) = self.disk_path(location, package, "") else {
            return Ok(Vec::new());
        };
        let mut entries = Vec::new();
        walk(&dir, recurse, kinds, &mut entries)?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn open_input(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<InputFile, FsError> {
        let disk = self
            .disk_path(location, package, name)
            .ok_or_else(|| FsError::NotFound {
                path: path::canonical_path(location, package, name),
            })?;
        let bytes = std::fs::read(&disk).map_err(|e| io_error(&disk, e))?;
        Ok(InputFile {
            path: disk.display().to_string(),
            kind: FileKind::from_name(name),
            contents: bytes.into(),
            last_modified: modified(&disk),
        })
    }

    fn open_output(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<Box<dyn OutputSink>, FsError> {
        let disk = self
            .disk_path(location, package, name)
            .ok_or_else(|| FsError::InvalidOutputLocation {
                location: location.name().to_string(),
            })?;
        Ok(Box::new(DiskSink {
            display: disk.display().to_string(),
            path: disk,
            buffer: Vec::new(),
            closed: false,
        }))
    }

    fn delete(&self, location: &Location, package: &str, name: &str) -> Result<bool, FsError> {
        let Some(disk) = self.disk_path(location, package, name) else {
            return Ok(false);
        };
        match std::fs::remove_file(&disk) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_error(&disk, err)),
        }
    }
}

/// Buffers output and writes it to disk on flush or close.
struct DiskSink {
    path: PathBuf,
    display: String,
    buffer: Vec<u8>,
    closed: bool,
}

impl DiskSink {
    fn persist(&self) -> Result<(), FsError> {
        if self.closed {
            return Err(FsError::StreamClosed { path: self.display.clone() });
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        std::fs::write(&self.path, &self.buffer).map_err(|e| io_error(&self.path, e))
    }
}

impl Write for DiskSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(std::io::Error::other(FsError::StreamClosed { path: self.display.clone() }));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.persist().map_err(std::io::Error::other)
    }
}

impl OutputSink for DiskSink {
    fn path(&self) -> &str {
        &self.display
    }

    fn flush_contents(&mut self) -> Result<(), FsError> {
        self.persist()
    }

    fn close(&mut self) -> Result<(), FsError> {
        if self.closed {
            return Ok(());
        }
        let result = self.persist();
        self.closed = true;
        result
    }
}

impl Drop for DiskSink {
    fn drop(&mut self) {
        if let Err(err) = OutputSink::close(self) {
            tracing::warn!(
                path = %self.display,
                error = %err,
                "disk sink dropped without persisting"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ALL_KINDS;

    #[test]
    fn unmapped_locations_are_empty() {
        let fm = PassThroughFileManager::new();
        assert!(!fm.handles(&Location::PlatformClassPath));
        assert!(fm
            .list(&Location::PlatformClassPath, "java.lang", &ALL_KINDS, true)
            .unwrap()
            .is_empty());
        assert!(matches!(
            fm.open_input(&Location::PlatformClassPath, "java.lang", "Object.class"),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn writes_and_reads_real_files() {
        let dir = std::env::temp_dir().join("plugin_harness_pass_through_test");
        let _ = std::fs::remove_dir_all(&dir);
        let fm = PassThroughFileManager::new().with_root(Location::Other("OUT".into()), &dir);
        let loc = Location::Other("OUT".into());

        let mut sink = fm.open_output(&loc, "a.b", "x.txt").unwrap();
        sink.write_all(b"on disk").unwrap();
        sink.close().unwrap();

        assert_eq!(fm.open_input(&loc, "a.b", "x.txt").unwrap().text(), "on disk");
        assert_eq!(fm.list(&loc, "a", &ALL_KINDS, true).unwrap().len(), 1);
        assert!(fm.list(&loc, "a", &ALL_KINDS, false).unwrap().is_empty());
        assert!(fm.delete(&loc, "a.b", "x.txt").unwrap());
        assert!(!fm.delete(&loc, "a.b", "x.txt").unwrap());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn dropped_sink_persists_its_buffer() {
        let dir = std::env::temp_dir().join("plugin_harness_pass_through_drop_test");
        let _ = std::fs::remove_dir_all(&dir);
        let loc = Location::Other("OUT".into());
        let fm = PassThroughFileManager::new().with_root(loc.clone(), &dir);

        {
            let mut sink = fm.open_output(&loc, "a", "x.txt").unwrap();
            sink.write_all(b"data").unwrap();
        }

        assert_eq!(fm.open_input(&loc, "a", "x.txt").unwrap().text(), "data");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
