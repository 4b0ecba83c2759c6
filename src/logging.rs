//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "PLUGIN_HARNESS_LOG";

/// Builds the filter: `debug` when verbose, else `PLUGIN_HARNESS_LOG`, else `warn`.
#[must_use]
pub fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs a stderr `fmt` subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_forces_debug() {
        assert_eq!(filter(true).to_string(), "debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
