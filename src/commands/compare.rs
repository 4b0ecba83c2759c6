//! `plugin-harness compare` command.

use std::path::Path;

use crate::adapters::live::PassThroughFileManager;
use crate::path::Location;
use crate::validate::{format_report, Comparison, Resources, ValidationReport, Validator};

/// Arguments for one comparison.
#[derive(Debug, Clone, Copy)]
pub struct CompareArgs<'a> {
    /// Directory served for `location`.
    pub root: &'a Path,
    /// Location name.
    pub location: &'a str,
    /// Relative path of the generated file.
    pub path: &'a str,
    /// Reference resource directory.
    pub resources: &'a Path,
    /// Reference resource name.
    pub reference: &'a str,
    /// Text rather than byte comparison.
    pub text: bool,
}

/// Compares a file on disk with a reference resource.
///
/// # Errors
///
/// Returns an error string if either side cannot be loaded.
pub fn compare(args: CompareArgs<'_>) -> Result<ValidationReport, String> {
    let location: Location = args.location.parse().unwrap_or_else(|never| match never {});
    let files = PassThroughFileManager::new().with_root(location.clone(), args.root);
    let resources = Resources::directory(args.resources);
    let comparison = if args.text { Comparison::Text } else { Comparison::Bytes };
    Validator::new(&files, &resources)
        .compare(&location, args.path, args.reference, comparison)
        .map_err(|err| err.to_string())
}

/// Execute the `compare` command.
///
/// # Errors
///
/// Returns an error string on mismatch or when either side cannot be loaded.
pub fn run(args: CompareArgs<'_>, json: bool) -> Result<(), String> {
    let report = compare(args)?;
    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("failed to render report: {e}"))?;
        println!("{rendered}");
    } else {
        println!("{}", format_report(&report));
    }
    report.into_result().map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_real_directories() {
        let dir = std::env::temp_dir().join("plugin_harness_compare_cmd_test");
        let out = dir.join("out");
        let refs = dir.join("refs");
        std::fs::create_dir_all(out.join("gen")).unwrap();
        std::fs::create_dir_all(&refs).unwrap();
        std::fs::write(out.join("gen/Out.txt"), "generated").unwrap();
        std::fs::write(refs.join("same.txt"), "generated").unwrap();
        std::fs::write(refs.join("other.txt"), "other").unwrap();

        let mut args = CompareArgs {
            root: &out,
            location: "CLASS_OUTPUT",
            path: "gen/Out.txt",
            resources: &refs,
            reference: "same.txt",
            text: false,
        };
        assert!(compare(args).unwrap().matched);
        assert!(run(args, true).is_ok());

        args.reference = "other.txt";
        let err = run(args, false).unwrap_err();
        assert!(err.contains("gen/Out.txt"));
        assert!(err.contains("other.txt"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
