//! `cbam.toml` parsing. Every key is optional; a missing file means all
//! defaults, which match the file names the cleaned exports ship with.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Top-level calculator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CalculatorConfig {
    #[serde(default)]
    pub tables: TablePaths,

    #[serde(default)]
    pub batch: BatchPaths,

    #[serde(default)]
    pub request: RequestDefaults,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TablePaths {
    #[serde(default = "default_benchmarks")]
    pub benchmarks: PathBuf,
    #[serde(default = "default_defaults")]
    pub defaults: PathBuf,
}

impl Default for TablePaths {
    fn default() -> Self {
        Self {
            benchmarks: default_benchmarks(),
            defaults: default_defaults(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchPaths {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for BatchPaths {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
        }
    }
}

/// Values applied to requests that leave a field empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RequestDefaults {
    /// Foreign carbon price already paid, EUR.
    #[serde(default)]
    pub already_paid_eur: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "warn" or "cbam_cost_core=debug".
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_benchmarks() -> PathBuf {
    PathBuf::from("cbam_benchmarks_final.csv")
}

fn default_defaults() -> PathBuf {
    PathBuf::from("cbam_defaults_final.csv")
}

fn default_input() -> PathBuf {
    PathBuf::from("cbam_input_template.csv")
}

fn default_output() -> PathBuf {
    PathBuf::from("cbam_results.csv")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl CalculatorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Like [`Self::from_file`], but a file that does not exist yields the
    /// defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("tables.benchmarks", &self.tables.benchmarks),
            ("tables.defaults", &self.tables.defaults),
            ("batch.input", &self.batch.input),
            ("batch.output", &self.batch.output),
        ];
        if let Some((key, _)) = paths.iter().find(|(_, p)| p.as_os_str().is_empty()) {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
        let paid = self.request.already_paid_eur;
        if !(paid.is_finite() && paid >= 0.0) {
            return Err(ConfigError::Validation(format!(
                "request.already_paid_eur must be a finite non-negative number, got {paid}"
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation("logging.level must not be empty".to_string()));
        }
        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            ConfigError::Validation(format!(
                "logging.level {:?} is not a valid filter: {e}",
                self.logging.level
            ))
        })?;
        Ok(())
    }
}
