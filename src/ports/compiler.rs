//! Host compiler port.

use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::ports::file_manager::FileManager;
use crate::ports::processor::{Processor, RootElement, SourceVersion};

/// One compiler invocation.
pub struct CompilationRequest {
    /// Raw option strings, e.g. `-Akey=value` or `-Werror`.
    pub options: Vec<String>,
    /// Elements handed to the first round.
    pub roots: Vec<RootElement>,
    /// Plugins to run, in registration order.
    pub processors: Vec<Box<dyn Processor>>,
    /// Files visible to the compiler and its plugins.
    pub file_manager: Arc<dyn FileManager>,
    /// Where diagnostics are reported.
    pub diagnostics: Arc<Diagnostics>,
    /// Language level being compiled.
    pub source_version: SourceVersion,
    /// Rounds to issue at minimum, counting the final round.
    pub min_rounds: u32,
    /// Rounds after which the compiler gives up.
    pub max_rounds: u32,
}

/// What the compiler reports back once it stops issuing rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilationReport {
    /// `true` if compilation succeeded.
    pub success: bool,
    /// Rounds issued.
    pub rounds: u32,
}

/// A compiler that drives plugins through rounds.
pub trait Compiler: Send + Sync {
    /// Runs the whole invocation to completion.
    fn compile(&self, request: CompilationRequest) -> CompilationReport;
}
