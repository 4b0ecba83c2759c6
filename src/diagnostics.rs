//! Diagnostic collector shared by the compiler, plugins, and driven routines.
//!
//! Records are kept in emission order. The collector is only queried after a
//! run, to build failure messages and for assertions in tests.

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails the compilation.
    Error,
    /// Reported but does not fail (unless `-Werror`).
    Warning,
    /// A warning the compiler is required to report.
    MandatoryWarning,
    /// Informational.
    Note,
    /// Anything else.
    Other,
}

impl Severity {
    /// Returns `true` for both kinds of warning.
    #[must_use]
    pub fn is_warning(self) -> bool {
        matches!(self, Self::Warning | Self::MandatoryWarning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::MandatoryWarning => "mandatory warning",
            Self::Note => "note",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Location a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Canonical path of the file.
    pub path: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

/// A single diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the record.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Where the problem is, if known.
    pub position: Option<SourcePosition>,
}

impl Diagnostic {
    /// Creates a diagnostic record.
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        position: Option<SourcePosition>,
    ) -> Self {
        Self { severity, message: message.into(), position }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(pos) => write!(
                f,
                "{}:{}:{}: {}: {}",
                pos.path, pos.line, pos.column, self.severity, self.message
            ),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Thread-safe collector of diagnostic records.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and mirrors it to the tracing subscriber.
    pub fn report(
        &self,
        severity: Severity,
        message: impl Into<String>,
        position: Option<SourcePosition>,
    ) {
        let diagnostic = Diagnostic::new(severity, message, position);
        match severity {
            Severity::Error => tracing::error!(diagnostic = %diagnostic, "diagnostic reported"),
            Severity::Warning | Severity::MandatoryWarning => {
                tracing::warn!(diagnostic = %diagnostic, "diagnostic reported");
            }
            Severity::Note | Severity::Other => {
                tracing::debug!(diagnostic = %diagnostic, "diagnostic reported");
            }
        }
        self.records.lock().push(diagnostic);
    }

    /// Records an error without a position.
    pub fn error(&self, message: impl Into<String>) {
        self.report(Severity::Error, message, None);
    }

    /// Records a warning without a position.
    pub fn warning(&self, message: impl Into<String>) {
        self.report(Severity::Warning, message, None);
    }

    /// Records a note without a position.
    pub fn note(&self, message: impl Into<String>) {
        self.report(Severity::Note, message, None);
    }

    /// Returns every record of the given severity, in emission order.
    #[must_use]
    pub fn with_severity(&self, severity: Severity) -> Vec<Diagnostic> {
        self.records.lock().iter().filter(|d| d.severity == severity).cloned().collect()
    }

    /// Returns every error-severity record.
    #[must_use]
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.with_severity(Severity::Error)
    }

    /// Returns every warning, mandatory or not.
    #[must_use]
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.records.lock().iter().filter(|d| d.severity.is_warning()).cloned().collect()
    }

    /// Returns `true` if any error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.records.lock().iter().any(|d| d.severity == Severity::Error)
    }

    /// Returns a copy of every record.
    #[must_use]
    pub fn all(&self) -> Vec<Diagnostic> {
        self.records.lock().clone()
    }

    /// Drops every record.
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Serializes every record as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.records.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_severity_in_emission_order() {
        let diagnostics = Diagnostics::new();
        diagnostics.error("first");
        diagnostics.warning("careful");
        diagnostics.error("second");
        diagnostics.report(Severity::MandatoryWarning, "deprecated", None);

        let errors = diagnostics.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "first");
        assert_eq!(errors[1].message, "second");
        assert_eq!(diagnostics.warnings().len(), 2);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn display_includes_position_when_known() {
        let d = Diagnostic::new(
            Severity::Warning,
            "unused",
            Some(SourcePosition { path: "SOURCE/a/B.java".into(), line: 3, column: 7 }),
        );
        assert_eq!(d.to_string(), "SOURCE/a/B.java:3:7: warning: unused");
    }

    #[test]
    fn json_export_uses_snake_case_severity() {
        let diagnostics = Diagnostics::new();
        diagnostics.report(Severity::MandatoryWarning, "x", None);
        let json = diagnostics.to_json().unwrap();
        assert!(json.contains("mandatory_warning"));
    }

    #[test]
    fn clear_drops_records() {
        let diagnostics = Diagnostics::new();
        diagnostics.note("hello");
        diagnostics.clear();
        assert!(diagnostics.all().is_empty());
    }
}
