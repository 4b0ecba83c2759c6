//! Named reference resources that generated output is compared against.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Where reference resources are loaded from.
#[derive(Debug, Clone)]
pub enum Resources {
    /// Files under a directory; names are relative paths.
    Directory(PathBuf),
    /// Contents held in memory.
    InMemory(BTreeMap<String, Vec<u8>>),
}

impl Resources {
    /// Resources read from `dir`.
    pub fn directory(dir: impl AsRef<Path>) -> Self {
        Self::Directory(dir.as_ref().to_path_buf())
    }

    /// An empty in-memory set.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::InMemory(BTreeMap::new())
    }

    /// Adds an in-memory resource. Ignored for directory resources.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        if let Self::InMemory(map) = &mut self {
            map.insert(name.into(), contents.into());
        }
        self
    }

    /// Loads the named resource.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ResourceNotFound`] if nothing is stored under `name`.
    pub fn load(&self, name: &str) -> Result<Vec<u8>, HarnessError> {
        let not_found = || HarnessError::ResourceNotFound { name: name.to_string() };
        match self {
            Self::Directory(dir) => {
                let path = dir.join(name.trim_start_matches('/'));
                std::fs::read(&path).map_err(|err| {
                    tracing::debug!(
                        path = %path.display(),
                        error = %err,
                        "reference resource unreadable"
                    );
                    not_found()
                })
            }
            Self::InMemory(map) => map.get(name).cloned().ok_or_else(not_found),
        }
    }
}
