//! Comparing generated files against reference resources.
//!
//! A generated file is named by location plus a slash-separated relative
//! path, which is split into package and file name and looked up through a
//! [`FileManager`]. Mismatches name both sides and point at the first
//! differing line or byte.

pub mod resources;

pub use resources::Resources;

use serde::Serialize;

use crate::error::HarnessError;
use crate::path::{split_relative, Location};
use crate::ports::file_manager::FileManager;

/// How generated and reference contents are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Byte-exact.
    #[default]
    Bytes,
    /// UTF-8 text with CRLF line endings normalized to LF.
    Text,
}

/// Outcome of one comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Canonical path of the generated file.
    pub generated: String,
    /// Name of the reference resource.
    pub reference: String,
    /// Comparison mode used.
    pub comparison: Comparison,
    /// Whether the contents matched.
    pub matched: bool,
    /// Where the contents first differ, if they do.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ValidationReport {
    /// Converts a mismatch into [`HarnessError::ValidationMismatch`].
    ///
    /// # Errors
    ///
    /// Returns the mismatch error when the contents differed.
    pub fn into_result(self) -> Result<(), HarnessError> {
        if self.matched {
            return Ok(());
        }
        Err(HarnessError::ValidationMismatch {
            generated: self.generated,
            reference: self.reference,
            detail: self.detail.unwrap_or_default(),
        })
    }
}

/// Checks generated output seen through a file manager.
pub struct Validator<'a> {
    files: &'a dyn FileManager,
    resources: &'a Resources,
}

impl<'a> Validator<'a> {
    /// Validates files from `files` against `resources`.
    pub fn new(files: &'a dyn FileManager, resources: &'a Resources) -> Self {
        Self { files, resources }
    }

    /// Compares one generated file with a reference resource and reports the result.
    ///
    /// # Errors
    ///
    /// Fails if the generated file or the reference cannot be loaded.
    pub fn compare(
        &self,
        location: &Location,
        relative_path: &str,
        reference: &str,
        comparison: Comparison,
    ) -> Result<ValidationReport, HarnessError> {
        let (package, name) = split_relative(relative_path);
        let generated = self.files.open_input(location, &package, &name)?;
        let expected = self.resources.load(reference)?;

        let detail = match comparison {
            Comparison::Bytes => first_byte_difference(&generated.contents, &expected),
            Comparison::Text => first_line_difference(&generated.contents, &expected),
        };
        tracing::debug!(
            generated = %generated.path,
            reference,
            matched = detail.is_none(),
            "compared generated output"
        );
        Ok(ValidationReport {
            generated: generated.path,
            reference: reference.to_string(),
            comparison,
            matched: detail.is_none(),
            detail,
        })
    }

    /// Asserts that a generated file matches a reference resource.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ValidationMismatch`] naming both sides when
    /// the contents differ, or the lookup error if either side is missing.
    pub fn expect_generated(
        &self,
        location: &Location,
        relative_path: &str,
        reference: &str,
        comparison: Comparison,
    ) -> Result<(), HarnessError> {
        self.compare(location, relative_path, reference, comparison)?.into_result()
    }
}

/// Formats a report for terminal output.
#[must_use]
pub fn format_report(report: &ValidationReport) -> String {
    let status = if report.matched { "PASS" } else { "FAIL" };
    let mut out = format!("[{status}] {} vs {}", report.generated, report.reference);
    if let Some(detail) = &report.detail {
        out.push_str("\n       ");
        out.push_str(detail);
    }
    out
}

fn first_byte_difference(generated: &[u8], reference: &[u8]) -> Option<String> {
    if generated == reference {
        return None;
    }
    let offset = generated.iter().zip(reference).take_while(|(a, b)| a == b).count();
    Some(format!(
        "first difference at byte {offset} (generated {} bytes, reference {} bytes)",
        generated.len(),
        reference.len()
    ))
}

fn first_line_difference(generated: &[u8], reference: &[u8]) -> Option<String> {
    let Ok(generated) = std::str::from_utf8(generated) else {
        return Some("generated file is not valid UTF-8".to_string());
    };
    let Ok(reference) = std::str::from_utf8(reference) else {
        return Some("reference resource is not valid UTF-8".to_string());
    };
    let generated = generated.replace("\r\n", "\n");
    let reference = reference.replace("\r\n", "\n");
    if generated == reference {
        return None;
    }

    let mut left = generated.split('\n');
    let mut right = reference.split('\n');
    let mut line = 1;
    loop {
        match (left.next(), right.next()) {
            (Some(a), Some(b)) if a == b => line += 1,
            (a, b) => {
                return Some(format!(
                    "line {line}: generated {}, reference {}",
                    describe_line(a),
                    describe_line(b)
                ));
            }
        }
    }
}

fn describe_line(line: Option<&str>) -> String {
    line.map_or_else(|| "<end of file>".to_string(), |text| format!("{text:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::VirtualFileSystem;

    fn store_with(contents: &str) -> VirtualFileSystem {
        let store = VirtualFileSystem::new();
        let file = store.get_for_output(&Location::ClassOutput, "gen", "Out.txt").unwrap();
        let mut stream = file.open_for_write().unwrap();
        stream.write_bytes(contents.as_bytes()).unwrap();
        stream.close().unwrap();
        store
    }

    #[test]
    fn matching_reference_passes() {
        let store = store_with("generated");
        let resources = Resources::in_memory().with("ref.txt", "generated");
        let validator = Validator::new(&store, &resources);
        validator
            .expect_generated(&Location::ClassOutput, "gen/Out.txt", "ref.txt", Comparison::Bytes)
            .unwrap();
    }

    #[test]
    fn mismatch_names_generated_file_and_reference() {
        let store = store_with("generated");
        let resources = Resources::in_memory().with("ref.txt", "other");
        let validator = Validator::new(&store, &resources);
        let err = validator
            .expect_generated(&Location::ClassOutput, "gen/Out.txt", "ref.txt", Comparison::Bytes)
            .unwrap_err();
        match err {
            HarnessError::ValidationMismatch { generated, reference, detail } => {
                assert_eq!(generated, "CLASS_OUTPUT/gen/Out.txt");
                assert_eq!(reference, "ref.txt");
                assert!(detail.contains("byte 0"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_comparison_ignores_crlf() {
        let store = store_with("one\r\ntwo\r\n");
        let resources = Resources::in_memory().with("ref.txt", "one\ntwo\n");
        let validator = Validator::new(&store, &resources);
        validator
            .expect_generated(&Location::ClassOutput, "gen/Out.txt", "ref.txt", Comparison::Text)
            .unwrap();
        assert!(validator
            .expect_generated(&Location::ClassOutput, "gen/Out.txt", "ref.txt", Comparison::Bytes)
            .is_err());
    }

    #[test]
    fn text_mismatch_reports_first_differing_line() {
        let store = store_with("a\nb\nc");
        let resources = Resources::in_memory().with("ref.txt", "a\nB\nc");
        let report = Validator::new(&store, &resources)
            .compare(&Location::ClassOutput, "gen/Out.txt", "ref.txt", Comparison::Text)
            .unwrap();
        assert!(!report.matched);
        assert_eq!(report.detail.as_deref(), Some("line 2: generated \"b\", reference \"B\""));
    }

    #[test]
    fn shorter_output_reports_end_of_file() {
        let detail = first_line_difference(b"a", b"a\nb").unwrap();
        assert_eq!(detail, "line 2: generated <end of file>, reference \"b\"");
    }

    #[test]
    fn missing_generated_file_is_not_found() {
        let store = VirtualFileSystem::new();
        let resources = Resources::in_memory().with("ref.txt", "x");
        let err = Validator::new(&store, &resources)
            .expect_generated(&Location::ClassOutput, "gen/None.txt", "ref.txt", Comparison::Bytes)
            .unwrap_err();
        assert!(matches!(err, HarnessError::Fs(_)));
    }

    #[test]
    fn report_serializes_for_json_output() {
        let report = ValidationReport {
            generated: "CLASS_OUTPUT/Out.txt".into(),
            reference: "ref.txt".into(),
            comparison: Comparison::Text,
            matched: true,
            detail: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["comparison"], "text");
        assert!(json.get("detail").is_none());
        assert!(format_report(&report).starts_with("[PASS]"));
    }
}
