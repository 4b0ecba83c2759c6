//! Locations, file kinds, and canonical path construction.
//!
//! Canonical paths have the shape
//! `<location>/<package-with-dots-as-slashes>/<name>`, with runs of `/`
//! collapsed to one. Construction is a pure function of its inputs, so a file
//! created from a class name and kind is found again by package and name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named root that files are resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    /// Input sources.
    Source,
    /// Generated sources.
    SourceOutput,
    /// Generated classes and resources.
    ClassOutput,
    /// Generated native headers.
    NativeHeaderOutput,
    /// User class path.
    ClassPath,
    /// Platform class path.
    PlatformClassPath,
    /// Path the plugins themselves are loaded from.
    ProcessorPath,
    /// Any other named location.
    Other(String),
}

impl Location {
    /// Every well-known location, in declaration order.
    pub const WELL_KNOWN: [Location; 7] = [
        Location::Source,
        Location::SourceOutput,
        Location::ClassOutput,
        Location::NativeHeaderOutput,
        Location::ClassPath,
        Location::PlatformClassPath,
        Location::ProcessorPath,
    ];

    /// Name used as the first canonical path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Source => "SOURCE",
            Self::SourceOutput => "SOURCE_OUTPUT",
            Self::ClassOutput => "CLASS_OUTPUT",
            Self::NativeHeaderOutput => "NATIVE_HEADER_OUTPUT",
            Self::ClassPath => "CLASS_PATH",
            Self::PlatformClassPath => "PLATFORM_CLASS_PATH",
            Self::ProcessorPath => "PROCESSOR_PATH",
            Self::Other(name) => name,
        }
    }

    /// Returns `true` if files may be created here.
    #[must_use]
    pub fn is_output(&self) -> bool {
        matches!(self, Self::SourceOutput | Self::ClassOutput | Self::NativeHeaderOutput)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Location {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::WELL_KNOWN
            .iter()
            .find(|loc| loc.name().eq_ignore_ascii_case(s))
            .cloned()
            .unwrap_or_else(|| Self::Other(s.to_string())))
    }
}

/// What a file holds, inferred from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Source code.
    Source,
    /// Compiled class.
    Class,
    /// HTML documentation.
    Html,
    /// Anything else.
    Other,
}

/// Every file kind, for unfiltered listings.
pub const ALL_KINDS: [FileKind; 4] =
    [FileKind::Source, FileKind::Class, FileKind::Html, FileKind::Other];

impl FileKind {
    /// Extension including the leading dot, empty for [`FileKind::Other`].
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Source => ".java",
            Self::Class => ".class",
            Self::Html => ".html",
            Self::Other => "",
        }
    }

    /// Infers the kind from a file name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        [Self::Source, Self::Class, Self::Html]
            .into_iter()
            .find(|kind| name.ends_with(kind.extension()))
            .unwrap_or(Self::Other)
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "class" => Ok(Self::Class),
            "html" => Ok(Self::Html),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown file kind: {other}")),
        }
    }
}

/// Collapses runs of `/` into one and strips a trailing `/`.
///
/// Idempotent: `canonicalize(canonicalize(p)) == canonicalize(p)`.
#[must_use]
pub fn canonicalize(path: &str) -> String {
    path.split('/').filter(|segment| !segment.is_empty()).collect::<Vec<_>>().join("/")
}

/// Canonical path for a package-relative name.
#[must_use]
pub fn canonical_path(location: &Location, package: &str, name: &str) -> String {
    canonicalize(&format!("{}/{}/{}", location.name(), package.replace('.', "/"), name))
}

/// Canonical path for a fully qualified class name and kind.
#[must_use]
pub fn canonical_class_path(location: &Location, class_name: &str, kind: FileKind) -> String {
    canonicalize(&format!(
        "{}/{}{}",
        location.name(),
        class_name.replace('.', "/"),
        kind.extension()
    ))
}

/// Canonical prefix (with trailing `/`) under which a package's files live.
#[must_use]
pub fn package_prefix(location: &Location, package: &str) -> String {
    let mut prefix = canonical_path(location, package, "");
    prefix.push('/');
    prefix
}

/// Splits a relative path `a/b/Foo.txt` into package `a.b` and name `Foo.txt`.
#[must_use]
pub fn split_relative(relative: &str) -> (String, String) {
    let relative = canonicalize(relative);
    match relative.rsplit_once('/') {
        Some((dir, name)) => (dir.replace('/', "."), name.to_string()),
        None => (String::new(), relative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_repeated_separators() {
        assert_eq!(canonicalize("a//b///c"), canonicalize("a/b/c"));
        assert_eq!(canonicalize("a//b///c"), "a/b/c");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = canonicalize("//SOURCE//x///y/");
        assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn class_and_package_lookups_collide() {
        let by_class = canonical_class_path(&Location::SourceOutput, "a.b.Foo", FileKind::Source);
        let by_name = canonical_path(&Location::SourceOutput, "a.b", "Foo.java");
        assert_eq!(by_class, by_name);
        assert_eq!(by_class, "SOURCE_OUTPUT/a/b/Foo.java");
    }

    #[test]
    fn empty_package_has_no_double_slash() {
        assert_eq!(
            canonical_path(&Location::ClassOutput, "", "META-INF/x.txt"),
            "CLASS_OUTPUT/META-INF/x.txt"
        );
        assert_eq!(package_prefix(&Location::Source, ""), "SOURCE/");
    }

    #[test]
    fn kind_is_inferred_from_extension() {
        assert_eq!(FileKind::from_name("Foo.java"), FileKind::Source);
        assert_eq!(FileKind::from_name("Foo.class"), FileKind::Class);
        assert_eq!(FileKind::from_name("index.html"), FileKind::Html);
        assert_eq!(FileKind::from_name("Foo.txt"), FileKind::Other);
    }

    #[test]
    fn location_names_parse_back() {
        for loc in Location::WELL_KNOWN {
            assert_eq!(loc.name().parse::<Location>().unwrap(), loc);
        }
        assert_eq!("custom".parse::<Location>().unwrap(), Location::Other("custom".into()));
    }

    #[test]
    fn split_relative_paths() {
        assert_eq!(split_relative("a/b/Foo.txt"), ("a.b".to_string(), "Foo.txt".to_string()));
        assert_eq!(split_relative("Foo.txt"), (String::new(), "Foo.txt".to_string()));
    }
}
