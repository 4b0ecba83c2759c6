//! Configures one compiler invocation and resolves its outcome.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::adapters::live::pass_through::PassThroughFileManager;
use crate::adapters::simulated::compiler::{scan_annotations, SimulatedCompiler};
use crate::config::HarnessConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{BoxError, HarnessError};
use crate::harness::outcome::{Captured, Outcome, WrapperState};
use crate::harness::task::Task;
use crate::harness::wrapper::{Driver, RoundDrivingWrapper};
use crate::path::{FileKind, Location};
use crate::ports::compiler::{CompilationRequest, Compiler};
use crate::ports::file_manager::FileManager;
use crate::ports::processor::{Processor, RootElement, SourceVersion};
use crate::vfs::{LayeredFileManager, VirtualFileSystem};

/// Package the synthetic placeholder root is created in.
pub const PLACEHOLDER_PACKAGE: &str = "harness.placeholder";

/// Rounds after which a run is declared runaway.
pub const DEFAULT_MAX_ROUNDS: u32 = 64;

enum RootSpec {
    Element(RootElement),
    File { location: Location, package: String, name: String },
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport<T> {
    /// Last value returned by the driven routine.
    pub value: Option<T>,
    /// Last flag returned by a directly driven plugin.
    pub claimed: Option<bool>,
    /// Times the compiler entered the wrapper.
    pub invocations: u32,
    /// Times driven code actually ran.
    pub executions: u32,
    /// Rounds the compiler issued.
    pub rounds: u32,
    /// Whether the compiler reported success. A returned report always
    /// carries `true`; failed compilations surface as
    /// [`HarnessError::CompilationFailed`] instead.
    pub success: bool,
    /// Where the wrapper's state machine ended up.
    pub state: WrapperState,
    /// Every diagnostic reported during the run.
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> RunReport<T> {
    /// Consumes the report, returning the routine's value.
    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

/// Builds and runs one compiler invocation around a plugin or task.
///
/// Whatever is registered is wrapped in a [`RoundDrivingWrapper`]. After the
/// run, a captured error is returned unchanged, a compiler failure becomes
/// [`HarnessError::CompilationFailed`], and otherwise the captured values
/// are reported.
pub struct ProcessingOrchestrator<T = ()> {
    options: Vec<String>,
    roots: Vec<RootSpec>,
    plugin: Option<Box<dyn Processor>>,
    task: Option<Task<T>>,
    store: Arc<VirtualFileSystem>,
    backing: Arc<dyn FileManager>,
    compiler: Arc<dyn Compiler>,
    source_version: SourceVersion,
    min_rounds: u32,
    max_rounds: u32,
}

impl Default for ProcessingOrchestrator<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingOrchestrator<()> {
    /// Creates an orchestrator with a fresh store and the simulated compiler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
            roots: Vec::new(),
            plugin: None,
            task: None,
            store: Arc::new(VirtualFileSystem::new()),
            backing: Arc::new(PassThroughFileManager::new()),
            compiler: Arc::new(SimulatedCompiler::new()),
            source_version: SourceVersion::LATEST,
            min_rounds: 0,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Creates an orchestrator from loaded configuration.
    #[must_use]
    pub fn from_config(config: &HarnessConfig) -> Self {
        let mut backing = PassThroughFileManager::new();
        if let Some(dir) = &config.class_path {
            backing = backing.with_root(Location::ClassPath, dir);
        }
        if let Some(dir) = &config.platform_dir {
            backing = backing.with_root(Location::PlatformClassPath, dir);
        }
        Self::new()
            .options(config.options.iter().cloned())
            .min_rounds(config.min_rounds)
            .max_rounds(config.max_rounds)
            .source_version(SourceVersion(config.source_version))
            .with_backing(Arc::new(backing))
    }
}

impl<T: Send + 'static> ProcessingOrchestrator<T> {
    /// Shares an existing store with the run.
    #[must_use]
    pub fn with_file_system(mut self, store: Arc<VirtualFileSystem>) -> Self {
        self.store = store;
        self
    }

    /// Serves non-store locations from `backing`.
    #[must_use]
    pub fn with_backing(mut self, backing: Arc<dyn FileManager>) -> Self {
        self.backing = backing;
        self
    }

    /// Runs with a different compiler.
    #[must_use]
    pub fn with_compiler(mut self, compiler: Arc<dyn Compiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Adds one option string.
    #[must_use]
    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    /// Adds option strings.
    #[must_use]
    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// Adds a root class carrying `annotations`.
    #[must_use]
    pub fn root_class<I, S>(mut self, name: impl Into<String>, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roots.push(RootSpec::Element(RootElement::new(name, annotations)));
        self
    }

    /// Adds a seeded source file as a root; its annotations are scanned at run time.
    #[must_use]
    pub fn root_file(
        mut self,
        location: Location,
        package: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.roots.push(RootSpec::File { location, package: package.into(), name: name.into() });
        self
    }

    /// Issues at least `rounds` rounds, counting the final one.
    #[must_use]
    pub fn min_rounds(mut self, rounds: u32) -> Self {
        self.min_rounds = rounds;
        self
    }

    /// Fails the run once `rounds` rounds have been issued without settling.
    #[must_use]
    pub fn max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }

    /// Sets the language level being compiled.
    #[must_use]
    pub fn source_version(mut self, version: SourceVersion) -> Self {
        self.source_version = version;
        self
    }

    /// Registers the plugin under test.
    #[must_use]
    pub fn plugin(mut self, plugin: impl Processor + 'static) -> Self {
        self.plugin = Some(Box::new(plugin));
        self
    }

    /// Registers a driven routine, replacing any earlier one.
    #[must_use]
    pub fn task<U>(self, task: Task<U>) -> ProcessingOrchestrator<U> {
        ProcessingOrchestrator {
            options: self.options,
            roots: self.roots,
            plugin: self.plugin,
            task: Some(task),
            store: self.store,
            backing: self.backing,
            compiler: self.compiler,
            source_version: self.source_version,
            min_rounds: self.min_rounds,
            max_rounds: self.max_rounds,
        }
    }

    /// The store the run writes into.
    #[must_use]
    pub fn file_system(&self) -> &Arc<VirtualFileSystem> {
        &self.store
    }

    fn resolve_roots(&self) -> Result<Vec<RootElement>, HarnessError> {
        let mut roots = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            match root {
                RootSpec::Element(element) => roots.push(element.clone()),
                RootSpec::File { location, package, name } => {
                    let file = self.store.get_for_input(location, package, name)?;
                    let stem = name.strip_suffix(FileKind::Source.extension()).unwrap_or(name);
                    let class_name = if package.is_empty() {
                        stem.to_string()
                    } else {
                        format!("{package}.{stem}")
                    };
                    roots.push(RootElement {
                        name: class_name,
                        annotations: scan_annotations(&file.text()),
                    });
                }
            }
        }
        if roots.is_empty() {
            let placeholder =
                format!("{PLACEHOLDER_PACKAGE}.Root_{}", uuid::Uuid::new_v4().simple());
            tracing::debug!(root = %placeholder, "no roots given; using placeholder");
            roots.push(RootElement::new(placeholder, Vec::<String>::new()));
        }
        Ok(roots)
    }

    /// Runs the compiler and resolves the outcome.
    ///
    /// # Errors
    ///
    /// Returns the driven code's own error unchanged if it failed;
    /// [`HarnessError::CompilationFailed`] if the compiler failed for another
    /// reason; [`HarnessError::IllegalState`] if neither a plugin nor a task
    /// was registered.
    ///
    /// # Panics
    ///
    /// Resumes any panic raised by the driven code, with its original payload.
    pub fn run(self) -> Result<RunReport<T>, BoxError> {
        let roots = self.resolve_roots()?;
        let has_task = self.task.is_some();
        let supported = self.plugin.as_ref().map(|plugin| plugin.supported_annotation_types());
        let candidates: BTreeSet<String> =
            roots.iter().flat_map(|root| root.annotations.iter().cloned()).collect();
        let driver = match (self.task, self.plugin) {
            (Some(task), plugin) => Driver::Task { task, plugin },
            (None, Some(plugin)) => Driver::Plugin(plugin),
            (None, None) => {
                return Err(Box::new(HarnessError::IllegalState(
                    "run requires a plugin or a task to be registered".into(),
                )));
            }
        };

        let diagnostics = Arc::new(Diagnostics::new());
        let outcome = Arc::new(Mutex::new(Outcome::default()));
        let wrapper =
            RoundDrivingWrapper::new(driver, Arc::clone(&self.store), Arc::clone(&outcome));
        let file_manager: Arc<dyn FileManager> =
            Arc::new(LayeredFileManager::new(Arc::clone(&self.store), self.backing));

        tracing::info!(roots = roots.len(), options = self.options.len(), "starting compilation");
        let report = self.compiler.compile(CompilationRequest {
            options: self.options,
            roots,
            processors: vec![Box::new(wrapper)],
            file_manager,
            diagnostics: Arc::clone(&diagnostics),
            source_version: self.source_version,
            min_rounds: self.min_rounds,
            max_rounds: self.max_rounds,
        });
        self.store.flush_open_streams();

        let outcome = std::mem::take(&mut *outcome.lock());
        if has_task && outcome.invocations == 0 {
            diagnostics.warning(never_invoked(supported.as_ref(), &candidates));
        }
        tracing::info!(
            rounds = report.rounds,
            success = report.success,
            invocations = outcome.invocations,
            executed = outcome.done,
            "compilation finished"
        );

        match outcome.thrown {
            Some(Captured::Panic(payload)) => std::panic::resume_unwind(payload),
            Some(Captured::Error(err)) => return Err(err),
            None => {}
        }
        if !report.success {
            return Err(Box::new(HarnessError::CompilationFailed {
                diagnostics: diagnostics.errors(),
            }));
        }
        Ok(RunReport {
            value: outcome.value,
            claimed: outcome.claimed,
            invocations: outcome.invocations,
            executions: outcome.executions,
            rounds: report.rounds,
            success: report.success,
            state: outcome.state,
            diagnostics: diagnostics.all(),
        })
    }
}

fn never_invoked(supported: Option<&BTreeSet<String>>, candidates: &BTreeSet<String>) -> String {
    let list = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");
    let supported = supported.map_or_else(|| "*".to_string(), list);
    format!(
        "driven routine never ran: supported annotation types [{supported}] \
         match none of the candidate annotations [{}]",
        list(candidates)
    )
}
