//! Binary entrypoint for the `plugin-harness` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match plugin_harness::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
