//! `plugin-harness canon` and `canon-class` commands.

use crate::path::{canonical_class_path, canonical_path, FileKind, Location};

/// Renders the canonical path for a package and file name.
#[must_use]
pub fn render(location: &str, package: &str, name: &str) -> String {
    let location: Location = location.parse().unwrap_or_else(|never| match never {});
    canonical_path(&location, package, name)
}

/// Renders the canonical path for a class name and kind.
///
/// # Errors
///
/// Returns an error string if `kind` is not a known file kind.
pub fn render_class(location: &str, class: &str, kind: &str) -> Result<String, String> {
    let location: Location = location.parse().unwrap_or_else(|never| match never {});
    let kind: FileKind = kind.parse()?;
    Ok(canonical_class_path(&location, class, kind))
}

/// Execute the `canon` command.
///
/// # Errors
///
/// Never fails; the signature matches the other handlers.
pub fn run(location: &str, package: &str, name: &str) -> Result<(), String> {
    println!("{}", render(location, package, name));
    Ok(())
}

/// Execute the `canon-class` command.
///
/// # Errors
///
/// Returns an error string if `kind` is not a known file kind.
pub fn run_class(location: &str, class: &str, kind: &str) -> Result<(), String> {
    println!("{}", render_class(location, class, kind)?);
    Ok(())
}
