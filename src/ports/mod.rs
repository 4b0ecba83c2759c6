//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the harness core and a
//! collaborator it does not own (time, file managers, the host compiler,
//! the plugin under test). Implementations live in `src/adapters/` and
//! `src/vfs/`.

pub mod clock;
pub mod compiler;
pub mod file_manager;
pub mod processor;

pub use clock::Clock;
pub use compiler::{CompilationReport, CompilationRequest, Compiler};
pub use file_manager::{FileEntry, FileManager, InputFile, OutputSink};
pub use processor::{
    Completion, ProcessingContext, Processor, RootElement, RoundInfo, SourceVersion,
};
