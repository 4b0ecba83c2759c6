//! Command dispatch and handlers.

pub mod canon;
pub mod compare;

use std::path::PathBuf;

use crate::cli::Command;
use crate::config::HarnessConfig;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Canon { location, package, name } => canon::run(location, package, name),
        Command::CanonClass { location, class, kind } => canon::run_class(location, class, kind),
        Command::Compare { root, location, path, resources, reference, text, json } => {
            let resources = resource_dir(resources.as_ref())?;
            let args = compare::CompareArgs {
                root,
                location,
                path,
                resources: &resources,
                reference,
                text: *text,
            };
            compare::run(args, *json)
        }
    }
}

/// Uses the explicit directory, else the one from `HarnessConfig::from_env`.
fn resource_dir(explicit: Option<&PathBuf>) -> Result<PathBuf, String> {
    if let Some(dir) = explicit {
        return Ok(dir.clone());
    }
    HarnessConfig::from_env()
        .map_err(|err| err.to_string())?
        .resource_dir
        .ok_or_else(|| {
            "no reference directory: pass --resources or set PLUGIN_HARNESS_RESOURCES".to_string()
        })
}
