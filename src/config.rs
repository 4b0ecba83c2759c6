//! Harness configuration loaded from YAML and the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::harness::orchestrator::DEFAULT_MAX_ROUNDS;
use crate::ports::processor::SourceVersion;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "PLUGIN_HARNESS_CONFIG";

/// Environment variable overriding the reference resource directory.
pub const RESOURCES_ENV: &str = "PLUGIN_HARNESS_RESOURCES";

/// Settings applied to every run. Missing YAML keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Compiler option strings, e.g. `-Akey=value`.
    pub options: Vec<String>,
    /// Rounds to issue at minimum, counting the final round.
    pub min_rounds: u32,
    /// Rounds after which a run is declared runaway.
    pub max_rounds: u32,
    /// Language level being compiled.
    pub source_version: u32,
    /// Directory holding reference resources for output validation.
    pub resource_dir: Option<PathBuf>,
    /// Directory served for `CLASS_PATH`.
    pub class_path: Option<PathBuf>,
    /// Directory served for `PLATFORM_CLASS_PATH`.
    pub platform_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            min_rounds: 0,
            max_rounds: DEFAULT_MAX_ROUNDS,
            source_version: SourceVersion::LATEST.0,
            resource_dir: None,
            class_path: None,
            platform_dir: None,
        }
    }
}

impl HarnessConfig {
    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if the YAML is malformed or invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, HarnessError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| HarnessError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if the file cannot be read or parsed.
    pub fn from_yaml_file(path: &Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Loads `.env`, then the file named by `PLUGIN_HARNESS_CONFIG` (or the
    /// defaults), then applies `PLUGIN_HARNESS_RESOURCES`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if the named file cannot be loaded.
    pub fn from_env() -> Result<Self, HarnessError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "ignoring unreadable .env file");
            }
        }
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_yaml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        if let Ok(dir) = std::env::var(RESOURCES_ENV) {
            config.resource_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), HarnessError> {
        if self.max_rounds == 0 {
            return Err(HarnessError::Config("max_rounds must be at least 1".into()));
        }
        if self.min_rounds > self.max_rounds {
            return Err(HarnessError::Config(format!(
                "min_rounds ({}) exceeds max_rounds ({})",
                self.min_rounds, self.max_rounds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = HarnessConfig::from_yaml_str("options: [\"-Adebug\"]\n").unwrap();
        assert_eq!(config.options, vec!["-Adebug".to_string()]);
        assert_eq!(config.max_rounds, DEFAULT_MAX_ROUNDS);
        assert_eq!(config.source_version, SourceVersion::LATEST.0);
        assert!(config.resource_dir.is_none());
    }

    #[test]
    fn rejects_inverted_round_limits() {
        let err = HarnessConfig::from_yaml_str("min_rounds: 9\nmax_rounds: 3\n").unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn loads_from_file() {
        let dir = std::env::temp_dir().join("plugin_harness_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("harness.yaml");
        std::fs::write(&path, "min_rounds: 3\nresource_dir: /tmp/refs\n").unwrap();

        let config = HarnessConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.min_rounds, 3);
        assert_eq!(config.resource_dir, Some(PathBuf::from("/tmp/refs")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let err =
            HarnessConfig::from_yaml_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }
}
