//! # CLI Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line flags (highest priority, `apply_flags`)                │
//! │                                                                         │
//! │  2. Environment Variables                                               │
//! │     CHARGECALC_ID_BASE=100                                              │
//! │     CHARGECALC_OUTPUT=json                                              │
//! │     CHARGECALC_LOG=debug                                                │
//! │                                                                         │
//! │  3. TOML Config File                                                    │
//! │     --config / CHARGECALC_CONFIG, else                                  │
//! │     ~/.config/chargecalc/chargecalc.toml (Linux)                        │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [catalog]
//! combination_id_base = 100
//!
//! [output]
//! format = "table"   # table | json
//! log_filter = "warn"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chargecalc_core::catalog::LEGACY_MAX_ID;
use chargecalc_core::DEFAULT_COMBINATION_ID_BASE;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

// =============================================================================
// Output Format
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One line per row, for terminals.
    #[default]
    Table,
    /// Pretty-printed JSON, for scripts.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: "output format".to_string(),
                reason: format!("unknown format '{}', expected table or json", other),
            }),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Catalog construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// First generated combination gets `combination_id_base + 1`.
    #[serde(default = "default_id_base")]
    pub combination_id_base: i32,
}

fn default_id_base() -> i32 {
    DEFAULT_COMBINATION_ID_BASE
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            combination_id_base: default_id_base(),
        }
    }
}

/// Output and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,

    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            format: OutputFormat::default(),
            log_filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

// =============================================================================
// Load Report
// =============================================================================

/// Where the file layer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file.
    File(PathBuf),
    /// This path was looked up but does not exist.
    Missing(PathBuf),
    /// No config path could be determined.
    Defaults,
}

/// An environment value that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// What happened while loading, reported once logging is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: ConfigSource,
    pub rejected: Vec<RejectedOverride>,
}

impl LoadReport {
    /// Emits the report through `tracing`.
    pub fn log(&self) {
        match &self.source {
            ConfigSource::File(path) => debug!(?path, "Config file loaded"),
            ConfigSource::Missing(path) => debug!(?path, "Config file not found, using defaults"),
            ConfigSource::Defaults => debug!("No config path available, using defaults"),
        }
        for rejected in &self.rejected {
            warn!(
                key = rejected.key,
                value = %rejected.value,
                reason = %rejected.reason,
                "Ignoring environment override"
            );
        }
    }
}

impl CliConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, `CHARGECALC_CONFIG`, or default path)
    /// 3. Environment variables
    ///
    /// The result is not validated: command line flags still apply on top,
    /// so the caller validates once they are merged.
    pub fn load(config_path: Option<PathBuf>) -> Result<(Self, LoadReport), ConfigError> {
        Self::load_from(config_path, |key| std::env::var(key).ok())
    }

    /// [`CliConfig::load`] over an arbitrary key lookup.
    pub fn load_from(
        config_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, LoadReport), ConfigError> {
        let path = config_path
            .or_else(|| lookup("CHARGECALC_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        let (mut config, source) = match path {
            Some(path) if path.exists() => (Self::from_file(&path)?, ConfigSource::File(path)),
            Some(path) => (Self::default(), ConfigSource::Missing(path)),
            None => (Self::default(), ConfigSource::Defaults),
        };

        let rejected = config.apply_overrides(lookup);
        Ok((config, LoadReport { source, rejected }))
    }

    /// Reads a TOML file without applying overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.combination_id_base < LEGACY_MAX_ID {
            return Err(ConfigError::InvalidValue {
                field: "catalog.combination_id_base".to_string(),
                reason: format!(
                    "{} overlaps the reserved ids 0..={}",
                    self.catalog.combination_id_base, LEGACY_MAX_ID
                ),
            });
        }

        if self.output.log_filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.log_filter".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Applies overrides from a key lookup (the process environment in
    /// production). Values that cannot be parsed are skipped and returned.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Vec<RejectedOverride> {
        let mut rejected = Vec::new();

        if let Some(base) = lookup("CHARGECALC_ID_BASE") {
            match base.parse::<i32>() {
                Ok(parsed) => self.catalog.combination_id_base = parsed,
                Err(err) => rejected.push(RejectedOverride {
                    key: "CHARGECALC_ID_BASE",
                    value: base,
                    reason: err.to_string(),
                }),
            }
        }

        if let Some(format) = lookup("CHARGECALC_OUTPUT") {
            match format.parse() {
                Ok(parsed) => self.output.format = parsed,
                Err(err) => rejected.push(RejectedOverride {
                    key: "CHARGECALC_OUTPUT",
                    value: format,
                    reason: err.to_string(),
                }),
            }
        }

        if let Some(filter) = lookup("CHARGECALC_LOG") {
            self.output.log_filter = filter;
        }

        rejected
    }

    /// Applies command line flags, the highest priority layer.
    pub fn apply_flags(&mut self, id_base: Option<i32>, format: Option<OutputFormat>) {
        if let Some(base) = id_base {
            self.catalog.combination_id_base = base;
        }
        if let Some(format) = format {
            self.output.format = format;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "chargecalc", "chargecalc")
            .map(|dirs| dirs.config_dir().join("chargecalc.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.catalog.combination_id_base, DEFAULT_COMBINATION_ID_BASE);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TABLE".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[catalog]\ncombination_id_base = 2000\n\n[output]\nformat = \"json\""
        )
        .unwrap();

        let config = CliConfig::from_file(file.path()).unwrap();
        assert_eq!(config.catalog.combination_id_base, 2000);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.log_filter, "warn");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let (config, report) = CliConfig::load_from(Some(missing.clone()), |_| None).unwrap();
        assert_eq!(config.catalog.combination_id_base, DEFAULT_COMBINATION_ID_BASE);
        assert_eq!(report.source, ConfigSource::Missing(missing));
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_load_reads_file_named_by_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[catalog]\ncombination_id_base = 300").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let (config, report) = CliConfig::load_from(None, |key| match key {
            "CHARGECALC_CONFIG" => Some(path.clone()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.catalog.combination_id_base, 300);
        assert_eq!(report.source, ConfigSource::File(file.path().to_path_buf()));
    }

    #[test]
    fn test_flag_overrides_invalid_environment_base() {
        let dir = tempfile::tempdir().unwrap();
        let (mut config, _) = CliConfig::load_from(Some(dir.path().join("none.toml")), |key| {
            match key {
                "CHARGECALC_ID_BASE" => Some("5".to_string()),
                _ => None,
            }
        })
        .unwrap();
        assert_eq!(config.catalog.combination_id_base, 5);
        assert!(config.validate().is_err());

        config.apply_flags(Some(200), None);
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog.combination_id_base, 200);
    }

    #[test]
    fn test_flags_take_priority_over_file_and_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nformat = \"json\"").unwrap();

        let (mut config, _) = CliConfig::load_from(Some(file.path().to_path_buf()), |key| {
            match key {
                "CHARGECALC_OUTPUT" => Some("json".to_string()),
                _ => None,
            }
        })
        .unwrap();
        config.apply_flags(None, Some(OutputFormat::Table));
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_malformed_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[catalog]\ncombination_id_base = \"many\"").unwrap();
        assert!(matches!(
            CliConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("CHARGECALC_ID_BASE", "500"),
            ("CHARGECALC_OUTPUT", "json"),
            ("CHARGECALC_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = CliConfig::default();
        let rejected = config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));
        assert!(rejected.is_empty());
        assert_eq!(config.catalog.combination_id_base, 500);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.log_filter, "debug");
    }

    #[test]
    fn test_bad_overrides_are_reported() {
        let mut config = CliConfig::default();
        let rejected = config.apply_overrides(|key| match key {
            "CHARGECALC_ID_BASE" => Some("lots".to_string()),
            "CHARGECALC_OUTPUT" => Some("xml".to_string()),
            _ => None,
        });
        assert_eq!(config.catalog.combination_id_base, DEFAULT_COMBINATION_ID_BASE);
        assert_eq!(config.output.format, OutputFormat::Table);

        let keys: Vec<&str> = rejected.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["CHARGECALC_ID_BASE", "CHARGECALC_OUTPUT"]);
        assert_eq!(rejected[1].value, "xml");
    }

    #[test]
    fn test_validation_rejects_reserved_base() {
        let mut config = CliConfig::default();
        config.catalog.combination_id_base = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let config = CliConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[catalog]"));
        assert!(toml_str.contains("[output]"));
    }
}
