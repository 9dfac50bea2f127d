//! Configuration for the `allocsim` binary.
//!
//! Everything is optional: a missing table or key falls back to its default,
//! and command-line flags override whatever the file says.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Log filter used when neither `RUST_LOG` nor the config file sets one.
pub const DEFAULT_LOG_FILTER: &str = "allocsim_core=warn,allocsim=warn";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings
    pub logging: LoggingConfig,
    /// Report settings
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this layout.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply command-line overrides on top of the file values.
    #[must_use]
    pub fn with_overrides(mut self, format: Option<OutputFormat>, no_diagnostics: bool) -> Self {
        if let Some(chosen) = format {
            self.report.format = chosen;
        }
        if no_diagnostics {
            self.report.show_diagnostics = false;
        }
        self
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,
    /// Colour log output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_owned(),
            ansi: false,
        }
    }
}

/// `[report]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// How the comparison is written to stdout
    pub format: OutputFormat,
    /// Print diagnostics ahead of the report
    pub show_diagnostics: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            show_diagnostics: true,
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Side-by-side text table
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test code is allowed to fail loudly"
)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(!config.logging.ansi);
        assert_eq!(config.report.format, OutputFormat::Table);
        assert!(config.report.show_diagnostics);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("[report]\nformat = \"json\"\n").expect("valid TOML");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(config.report.show_diagnostics);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::default().with_overrides(Some(OutputFormat::Json), true);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(!config.report.show_diagnostics);

        let untouched = Config::default().with_overrides(None, false);
        assert_eq!(untouched, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("allocsim.toml");
        fs::write(
            &path,
            "[logging]\nfilter = \"allocsim_core=debug\"\nansi = true\n",
        )
        .expect("Failed to write config");

        let config = Config::load_from_file(&path).expect("Failed to load config");
        assert_eq!(config.logging.filter, "allocsim_core=debug");
        assert!(config.logging.ansi);
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("allocsim.toml");
        fs::write(&path, "[report]\nformat = \"xml\"\n").expect("Failed to write config");

        let error = Config::load_from_file(&path).unwrap_err();
        assert!(error.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let error = Config::load_from_file(&temp.path().join("absent.toml")).unwrap_err();
        assert!(error.to_string().contains("Failed to read config file"));
    }
}
