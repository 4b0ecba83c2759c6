//! Per-round façade handed to driven routines.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::error::{BoxError, FsError, HarnessError};
use crate::path::Location;
use crate::ports::file_manager::FileManager;
use crate::ports::processor::{ProcessingContext, Processor, RoundInfo};
use crate::vfs::VirtualFileSystem;

/// Everything a driven routine can see during one round.
///
/// Assembled fresh for each executed round and discarded afterwards.
pub struct TestEnvironment<'a> {
    context: &'a ProcessingContext,
    store: &'a Arc<VirtualFileSystem>,
    round: &'a RoundInfo,
    annotations: &'a BTreeSet<String>,
    invocation_count: u32,
    plugin: Option<&'a mut (dyn Processor + 'static)>,
}

impl<'a> TestEnvironment<'a> {
    pub(crate) fn new(
        context: &'a ProcessingContext,
        store: &'a Arc<VirtualFileSystem>,
        round: &'a RoundInfo,
        annotations: &'a BTreeSet<String>,
        invocation_count: u32,
        plugin: Option<&'a mut (dyn Processor + 'static)>,
    ) -> Self {
        Self { context, store, round, annotations, invocation_count, plugin }
    }

    /// The in-memory file store.
    #[must_use]
    pub fn file_system(&self) -> &Arc<VirtualFileSystem> {
        self.store
    }

    /// The layered file manager plugins see.
    #[must_use]
    pub fn file_manager(&self) -> &Arc<dyn FileManager> {
        &self.context.file_manager
    }

    /// The run's diagnostic collector.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.context.diagnostics
    }

    /// `-A` options passed to the compiler.
    #[must_use]
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.context.options
    }

    /// The processing context the compiler supplied at init.
    #[must_use]
    pub fn context(&self) -> &ProcessingContext {
        self.context
    }

    /// Current round.
    #[must_use]
    pub fn round(&self) -> &RoundInfo {
        self.round
    }

    /// Annotations handed to this round after filtering by supported types.
    #[must_use]
    pub fn annotations(&self) -> &BTreeSet<String> {
        self.annotations
    }

    /// How many times the compiler has entered the wrapper, this round included.
    #[must_use]
    pub fn invocation_count(&self) -> u32 {
        self.invocation_count
    }

    /// The plugin under test, if one was registered.
    #[must_use]
    pub fn plugin(&self) -> Option<&(dyn Processor + 'static)> {
        self.plugin.as_deref()
    }

    /// Mutable access to the plugin under test.
    pub fn plugin_mut(&mut self) -> Option<&mut (dyn Processor + 'static)> {
        self.plugin.as_deref_mut()
    }

    /// Runs the plugin under test on this round's annotations.
    ///
    /// # Errors
    ///
    /// Returns the plugin's own error, or [`HarnessError::IllegalState`] if
    /// no plugin was registered.
    pub fn run_plugin(&mut self) -> Result<bool, BoxError> {
        let annotations = self.annotations;
        let round = self.round;
        match self.plugin.as_deref_mut() {
            Some(plugin) => plugin.process(annotations, round),
            None => Err(Box::new(HarnessError::IllegalState(
                "no plugin under test was registered".into(),
            ))),
        }
    }

    /// Writes `contents` to an output file in one shot.
    ///
    /// # Errors
    ///
    /// Fails if the location is not an output location or the file is busy.
    pub fn write_output(
        &self,
        location: &Location,
        package: &str,
        name: &str,
        contents: impl AsRef<[u8]>,
    ) -> Result<(), FsError> {
        let file = self.store.get_for_output(location, package, name)?;
        let mut stream = file.open_for_write()?;
        stream.write_bytes(contents.as_ref())?;
        stream.close()
    }

    /// Reads a file through the layered file manager as text.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] if the file does not exist.
    pub fn read_text(
        &self,
        location: &Location,
        package: &str,
        name: &str,
    ) -> Result<String, FsError> {
        Ok(self.context.file_manager.open_input(location, package, name)?.text())
    }
}

impl std::fmt::Debug for TestEnvironment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestEnvironment")
            .field("round", &self.round.number())
            .field("annotations", self.annotations)
            .field("invocation_count", &self.invocation_count)
            .field("has_plugin", &self.plugin.is_some())
            .finish_non_exhaustive()
    }
}
