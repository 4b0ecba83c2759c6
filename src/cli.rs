//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `plugin-harness`.
#[derive(Debug, Parser)]
#[command(
    name = "plugin-harness",
    version,
    about = "Inspect and validate annotation-processor test output"
)]
pub struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the canonical path for a package and file name.
    Canon {
        /// Location name, e.g. `SOURCE` or `CLASS_OUTPUT`.
        location: String,
        /// Dotted package name; may be empty.
        package: String,
        /// File name.
        name: String,
    },
    /// Print the canonical path for a class name and file kind.
    CanonClass {
        /// Location name.
        location: String,
        /// Dotted class name.
        class: String,
        /// File kind: source, class, html, or other.
        #[arg(long, default_value = "source")]
        kind: String,
    },
    /// Compare a file under a real directory with a reference resource.
    Compare {
        /// Directory served for `--location`.
        #[arg(long)]
        root: PathBuf,
        /// Location the file lives in.
        #[arg(long, default_value = "CLASS_OUTPUT")]
        location: String,
        /// Slash-separated path of the generated file, relative to the location.
        path: String,
        /// Directory holding reference resources; defaults to the configured `resource_dir`.
        #[arg(long)]
        resources: Option<PathBuf>,
        /// Reference resource name.
        reference: String,
        /// Compare as UTF-8 text with CRLF normalized.
        #[arg(long)]
        text: bool,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_canon_subcommand() {
        let cli = Cli::parse_from(["plugin-harness", "canon", "SOURCE", "a.b", "Foo.java"]);
        assert!(matches!(
            cli.command,
            Command::Canon { ref location, ref package, ref name }
                if location == "SOURCE" && package == "a.b" && name == "Foo.java"
        ));
        assert!(!cli.verbose);
    }

    #[test]
    fn parses_canon_class_with_default_kind() {
        let cli = Cli::parse_from(["plugin-harness", "canon-class", "CLASS_OUTPUT", "a.B"]);
        assert!(matches!(cli.command, Command::CanonClass { ref kind, .. } if kind == "source"));
    }

    #[test]
    fn parses_compare_flags() {
        let cli = Cli::parse_from([
            "plugin-harness",
            "-v",
            "compare",
            "--root",
            "/tmp/out",
            "gen/Out.txt",
            "--resources",
            "/tmp/refs",
            "ref.txt",
            "--text",
            "--json",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Command::Compare { location, path, reference, text, json, .. } => {
                assert_eq!(location, "CLASS_OUTPUT");
                assert_eq!(path, "gen/Out.txt");
                assert_eq!(reference, "ref.txt");
                assert!(text && json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
