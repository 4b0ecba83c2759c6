//! Error types shared across the harness.

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// Boxed error produced by user code: plugins and driven routines.
///
/// The harness never wraps these; a captured `BoxError` is handed back to the
/// caller as-is so it can be downcast to its original type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by the file store and its streams.
#[derive(Debug, Error)]
pub enum FsError {
    /// No live file exists at the canonical path.
    #[error("file not found: {path}")]
    NotFound {
        /// Canonical path that was looked up.
        path: String,
    },

    /// A stream is already open for writing on this file.
    #[error("file is already open for writing: {path}")]
    AlreadyOpenForWriting {
        /// Canonical path of the contended file.
        path: String,
    },

    /// The file was seeded read-only.
    #[error("file is read-only: {path}")]
    ReadOnly {
        /// Canonical path of the read-only file.
        path: String,
    },

    /// The file was deleted (or the store reset) while a stream was open.
    #[error("file was removed while open for writing: {path}")]
    FileRemoved {
        /// Canonical path of the removed file.
        path: String,
    },

    /// The stream was already closed.
    #[error("stream is closed: {path}")]
    StreamClosed {
        /// Canonical path of the stream's target.
        path: String,
    },

    /// A call was made after `close()`.
    #[error("file system is closed")]
    ClosedFileSystem,

    /// Output was requested for a location that does not accept output.
    #[error("not an output location: {location}")]
    InvalidOutputLocation {
        /// Name of the offending location.
        location: String,
    },

    /// Disk I/O failed in the pass-through manager.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path on disk.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Failures raised by the harness itself.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A file-store operation failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The compiler failed and no plugin error explains why.
    #[error("compilation failed:\n{}", render(diagnostics))]
    CompilationFailed {
        /// Error-severity diagnostics collected during the run.
        diagnostics: Vec<Diagnostic>,
    },

    /// The harness was driven incorrectly (e.g. run with nothing registered).
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A generated file did not match its reference resource.
    #[error("generated file {generated} does not match reference {reference}: {detail}")]
    ValidationMismatch {
        /// Canonical path of the generated file.
        generated: String,
        /// Name of the reference resource.
        reference: String,
        /// Where the contents first differ.
        detail: String,
    },

    /// A named reference resource could not be found.
    #[error("reference resource not found: {name}")]
    ResourceNotFound {
        /// Resource name.
        name: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

fn render(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "  (no error diagnostics reported)".to_string();
    }
    diagnostics.iter().map(|d| format!("  {d}")).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    #[test]
    fn compilation_failed_lists_each_diagnostic() {
        let err = HarnessError::CompilationFailed {
            diagnostics: vec![
                Diagnostic::new(Severity::Error, "cannot find symbol", None),
                Diagnostic::new(Severity::Error, "missing return", None),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("cannot find symbol"));
        assert!(text.contains("missing return"));
    }

    #[test]
    fn fs_errors_convert_transparently() {
        let err: HarnessError = FsError::NotFound { path: "SOURCE/a/B.java".into() }.into();
        assert_eq!(err.to_string(), "file not found: SOURCE/a/B.java");
    }
}
