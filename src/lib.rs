//! In-memory file store and round driver for testing multi-round compiler
//! plugins.
//!
//! A test registers a plugin or a [`Task`] with a [`ProcessingOrchestrator`],
//! which runs one compiler invocation against a [`VirtualFileSystem`] and
//! hands back whatever the driven code returned or threw.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod harness;
pub mod logging;
pub mod path;
pub mod ports;
pub mod validate;
pub mod vfs;

pub use config::HarnessConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{BoxError, FsError, HarnessError};
pub use harness::{ProcessingOrchestrator, Reentrancy, RunReport, Task, TestEnvironment};
pub use path::{FileKind, Location, ALL_KINDS};
pub use validate::{Comparison, Resources, Validator};
pub use vfs::{FileStream, VirtualFile, VirtualFileSystem};

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    logging::init(cli.verbose);
    commands::dispatch(&cli.command)
}
