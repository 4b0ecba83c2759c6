//! File manager that consults the in-memory store before a backing manager.

use std::sync::Arc;

use super::VirtualFileSystem;
use crate::error::FsError;
use crate::path::{FileKind, Location};
use crate::ports::file_manager::{FileEntry, FileManager, InputFile, OutputSink};

/// Routes each call to the store when it owns the location, otherwise to the
/// backing manager.
///
/// Inputs missing from a store-owned input location fall through to the
/// backing manager. The backing manager is never shadowed or cached.
pub struct LayeredFileManager {
    store: Arc<VirtualFileSystem>,
    backing: Arc<dyn FileManager>,
}

impl LayeredFileManager {
    /// Layers `store` over `backing`.
    pub fn new(store: Arc<VirtualFileSystem>, backing: Arc<dyn FileManager>) -> Self {
        Self { store, backing }
    }

    /// The in-memory store.
    #[must_use]
    pub fn store(&self) -> &Arc<VirtualFileSystem> {
        &self.store
    }
}

impl FileManager for LayeredFileManager {
    fn handles(&self, location: &Location) -> bool {
        VirtualFileSystem::owns(location) || self.backing.handles(location)
    }

    fn resolve(&self, location: &Location, package: &str, name: &str) -> String {
        if VirtualFileSystem::owns(location) {
            self.store.resolve(location, package, name)
        } else {
            self.backing.resolve(location, package, name)
        }
    }

    fn list(
        &self,
        location: &Location,
        package: &str,
        kinds: &[FileKind],
        recurse: bool,
    ) -> Result<Vec<FileEntry>, FsError> {
        if VirtualFileSystem::owns(location) {
            FileManager::list(&*self.store, location, package, kinds, recurse)
        } else {
            self.backing.list(location, package, kinds, recurse)
        }
    }

    fn open_input(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<InputFile, FsError> {
        if !VirtualFileSystem::owns(location) {
            return self.backing.open_input(location, package, name);
        }
        match self.store.open_input(location, package, name) {
            Err(FsError::NotFound { .. })
                if !location.is_output() && self.backing.handles(location) =>
            {
                self.backing.open_input(location, package, name)
            }
            other => other,
        }
    }

    fn open_output(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<Box<dyn OutputSink>, FsError> {
        if VirtualFileSystem::owns(location) {
            self.store.open_output(location, package, name)
        } else {
            self.backing.open_output(location, package, name)
        }
    }

    fn delete(&self, location: &Location, package: &str, name: &str) -> Result<bool, FsError> {
        if VirtualFileSystem::owns(location) {
            FileManager::delete(&*self.store, location, package, name)
        } else {
            self.backing.delete(location, package, name)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::adapters::live::pass_through::PassThroughFileManager;
    use crate::path::ALL_KINDS;

    #[test]
    fn store_locations_never_touch_backing() {
        let store = Arc::new(VirtualFileSystem::new());
        let layered =
            LayeredFileManager::new(Arc::clone(&store), Arc::new(PassThroughFileManager::new()));

        let mut sink = layered.open_output(&Location::SourceOutput, "g", "A.java").unwrap();
        sink.write_all(b"class A {}").unwrap();
        sink.close().unwrap();

        let input = layered.open_input(&Location::SourceOutput, "g", "A.java").unwrap();
        assert_eq!(input.text(), "class A {}");
        assert_eq!(store.get("SOURCE_OUTPUT/g/A.java").unwrap().text(), "class A {}");
    }

    #[test]
    fn other_locations_go_to_backing() {
        let dir = std::env::temp_dir().join("plugin_harness_layered_test");
        let lib = dir.join("lib");
        std::fs::create_dir_all(lib.join("x")).unwrap();
        std::fs::write(lib.join("x").join("Dep.class"), b"\xca\xfe").unwrap();

        let backing = PassThroughFileManager::new().with_root(Location::ClassPath, &lib);
        let layered =
            LayeredFileManager::new(Arc::new(VirtualFileSystem::new()), Arc::new(backing));

        let listed = layered.list(&Location::ClassPath, "x", &ALL_KINDS, false).unwrap();
        assert_eq!(listed.len(), 1);
        let input = layered.open_input(&Location::ClassPath, "x", "Dep.class").unwrap();
        assert_eq!(&*input.contents, b"\xca\xfe");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
