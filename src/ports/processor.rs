//! Plugin contract: what the host compiler calls on every plugin.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::BoxError;
use crate::ports::file_manager::FileManager;

/// Language level a plugin understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceVersion(pub u32);

impl SourceVersion {
    /// Newest level the harness knows about.
    pub const LATEST: SourceVersion = SourceVersion(21);
}

impl Default for SourceVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for SourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RELEASE_{}", self.0)
    }
}

/// A top-level element handed to a round, with the annotations it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootElement {
    /// Qualified name.
    pub name: String,
    /// Qualified annotation identifiers present on the element.
    pub annotations: BTreeSet<String>,
}

impl RootElement {
    /// Creates a root element.
    pub fn new<I, S>(name: impl Into<String>, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { name: name.into(), annotations: annotations.into_iter().map(Into::into).collect() }
    }
}

/// State of one processing round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundInfo {
    number: u32,
    root_elements: Vec<RootElement>,
    processing_over: bool,
    error_raised: bool,
}

impl RoundInfo {
    /// Creates round state. Round numbers start at 1.
    #[must_use]
    pub fn new(
        number: u32,
        root_elements: Vec<RootElement>,
        processing_over: bool,
        error_raised: bool,
    ) -> Self {
        Self { number, root_elements, processing_over, error_raised }
    }

    /// 1-based round number.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Elements handed to this round.
    #[must_use]
    pub fn root_elements(&self) -> &[RootElement] {
        &self.root_elements
    }

    /// `true` on the final round, after which no more rounds are issued.
    #[must_use]
    pub fn processing_over(&self) -> bool {
        self.processing_over
    }

    /// `true` if an earlier round reported an error.
    #[must_use]
    pub fn error_raised(&self) -> bool {
        self.error_raised
    }

    /// Union of the annotations on every root element.
    #[must_use]
    pub fn annotations_present(&self) -> BTreeSet<String> {
        self.root_elements.iter().flat_map(|e| e.annotations.iter().cloned()).collect()
    }

    /// Root elements carrying `annotation`.
    #[must_use]
    pub fn elements_annotated_with(&self, annotation: &str) -> Vec<&RootElement> {
        self.root_elements.iter().filter(|e| e.annotations.contains(annotation)).collect()
    }
}

/// A completion suggestion for an annotation member value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Text to insert.
    pub value: String,
    /// Optional explanation.
    pub message: String,
}

/// Everything a plugin receives at initialization.
#[derive(Clone)]
pub struct ProcessingContext {
    /// `-Akey=value` options passed to the compiler.
    pub options: BTreeMap<String, String>,
    /// Files visible to the plugin.
    pub file_manager: Arc<dyn FileManager>,
    /// Where plugin messages go.
    pub diagnostics: Arc<Diagnostics>,
    /// Language level being compiled.
    pub source_version: SourceVersion,
}

impl fmt::Debug for ProcessingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingContext")
            .field("options", &self.options)
            .field("source_version", &self.source_version)
            .finish_non_exhaustive()
    }
}

/// A compiler plugin executed once per round.
pub trait Processor: Send {
    /// Name used in diagnostics.
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Annotation patterns this plugin handles: `*`, `pkg.*`, or exact names.
    fn supported_annotation_types(&self) -> BTreeSet<String>;

    /// Option keys this plugin recognizes.
    fn supported_options(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Newest language level this plugin understands.
    fn supported_source_version(&self) -> SourceVersion {
        SourceVersion::LATEST
    }

    /// Called once before the first round.
    fn init(&mut self, context: &ProcessingContext);

    /// Processes one round. Returning `true` claims `annotations`.
    ///
    /// # Errors
    ///
    /// An error aborts the compilation.
    fn process(
        &mut self,
        annotations: &BTreeSet<String>,
        round: &RoundInfo,
    ) -> Result<bool, BoxError>;

    /// Suggests values for an annotation member.
    fn completions(
        &self,
        _element: &str,
        _annotation: &str,
        _member: &str,
        _user_text: &str,
    ) -> Vec<Completion> {
        Vec::new()
    }
}

/// Returns `true` if `annotation` matches a supported-type `pattern`.
#[must_use]
pub fn pattern_matches(pattern: &str, annotation: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    match pattern.strip_suffix(".*") {
        Some(prefix) => annotation
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.')),
        None => pattern == annotation,
    }
}

/// Subset of `candidates` matched by any of `patterns`.
#[must_use]
pub fn filter_supported(
    patterns: &BTreeSet<String>,
    candidates: &BTreeSet<String>,
) -> BTreeSet<String> {
    candidates
        .iter()
        .filter(|a| patterns.iter().any(|p| pattern_matches(p, a)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_everything() {
        assert!(pattern_matches("*", "x.Y"));
    }

    #[test]
    fn package_wildcard_matches_nested_names_only() {
        assert!(pattern_matches("a.b.*", "a.b.Ann"));
        assert!(pattern_matches("a.b.*", "a.b.c.Ann"));
        assert!(!pattern_matches("a.b.*", "a.bc.Ann"));
        assert!(!pattern_matches("a.b.*", "a.b"));
    }

    #[test]
    fn exact_names_match_exactly() {
        assert!(pattern_matches("a.Ann", "a.Ann"));
        assert!(!pattern_matches("a.Ann", "a.Annotation"));
    }

    #[test]
    fn round_reports_present_annotations() {
        let round = RoundInfo::new(
            1,
            vec![RootElement::new("a.Foo", ["x.A"]), RootElement::new("a.Bar", ["x.A", "x.B"])],
            false,
            false,
        );
        let present: Vec<_> = round.annotations_present().into_iter().collect();
        assert_eq!(present, vec!["x.A".to_string(), "x.B".to_string()]);
        assert_eq!(round.elements_annotated_with("x.B").len(), 1);
    }

    #[test]
    fn filter_keeps_only_supported() {
        let patterns: BTreeSet<String> = ["x.*".to_string()].into();
        let candidates: BTreeSet<String> = ["x.A".to_string(), "y.B".to_string()].into();
        let kept = filter_supported(&patterns, &candidates);
        assert_eq!(kept.len(), 1);
        assert!(kept.contains("x.A"));
    }
}
