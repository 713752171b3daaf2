//! Runtime configuration for the CLI.
//!
//! Loaded from `dyaml.toml` in the working directory (or `--config <path>`),
//! every field falling back to a default. Command-line flags override it.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CliError;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dyaml.toml";

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log filter used when `DYAML_LOG` is unset: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Report stylistic validation findings as errors.
    #[serde(default)]
    pub strict: bool,

    /// Emit JSON instead of text.
    #[serde(default)]
    pub json: bool,

    /// Keep comments as `$human$` annotations when converting and normalizing.
    #[serde(default = "default_preserve_annotations")]
    pub preserve_annotations: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_preserve_annotations() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            strict: false,
            json: false,
            preserve_annotations: default_preserve_annotations(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let contents =
            fs::read_to_string(path).map_err(|source| CliError::read(path.to_path_buf(), source))?;
        toml::from_str(&contents).map_err(|err| CliError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// Loads the explicit file, else `dyaml.toml` when present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, CliError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Self::load(&fallback);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = toml::from_str("strict = true\n").unwrap();
        assert!(config.strict);
        assert!(!config.json);
        assert!(config.preserve_annotations);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<Config>("stict = true\n").is_err());
    }
}
