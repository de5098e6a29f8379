//! Pipeline configuration.
//!
//! [`EtlConfig`] can be built in code (start from [`Default`]) or loaded from a JSON file with
//! [`EtlConfig::from_path`]. Missing keys take their default value.
//!
//! ```
//! use nba_stats_etl::config::EtlConfig;
//!
//! let cfg: EtlConfig = serde_json::from_str(r#"{ "database_path": "stats.db", "season": "2023-24" }"#)
//!     .unwrap();
//! assert_eq!(cfg.season, "2023-24");
//! assert_eq!(cfg.delimiter, ',');
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ingestion::{ExtractOptions, SourceLocation, TextEncoding};
use crate::pipeline::{PipelineOptions, Severity};
use crate::processing::TransformOptions;

/// Where the source file comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Primary delimited file.
    pub path: PathBuf,
    /// Pre-staged payload used when `path` does not exist.
    pub fallback_path: Option<PathBuf>,
    /// Copy the fallback payload to `path` after a successful read.
    pub persist_fallback: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("nba_player_stats.csv"),
            fallback_path: Some(PathBuf::from("paste.txt")),
            persist_fallback: true,
        }
    }
}

/// Full configuration for a [`crate::pipeline::Pipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// `SQLite` database file.
    pub database_path: PathBuf,
    pub source: SourceConfig,
    /// Field delimiter. Must be a single ASCII character.
    pub delimiter: char,
    pub encoding: TextEncoding,
    /// Cell contents treated as missing values.
    pub null_sentinels: Vec<String>,
    /// Season label used when the source has no `season` column.
    pub season: String,
    /// Failures at or above this severity are also reported through `on_alert`.
    pub alert_at_or_above: Severity,
}

impl Default for EtlConfig {
    fn default() -> Self {
        let transform = TransformOptions::default();
        Self {
            database_path: PathBuf::from("nba_stats.db"),
            source: SourceConfig::default(),
            delimiter: ',',
            encoding: TextEncoding::Auto,
            null_sentinels: transform.null_sentinels,
            season: transform.season,
            alert_at_or_above: Severity::Critical,
        }
    }
}

impl EtlConfig {
    /// Read and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check values serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.delimiter.is_ascii() || self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(ConfigError::Invalid {
                message: format!("delimiter must be a single ASCII character, got {:?}", self.delimiter),
            });
        }
        if self.season.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "season must not be empty".to_string(),
            });
        }
        if self.null_sentinels.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                message: "null sentinels must not be blank (blank cells are already null)".to_string(),
            });
        }
        Ok(())
    }

    pub fn source_location(&self) -> SourceLocation {
        SourceLocation {
            primary: self.source.path.clone(),
            fallback: self.source.fallback_path.clone(),
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            delimiter: self.delimiter as u8,
            encoding: self.encoding,
            persist_fallback: self.source.persist_fallback,
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            season: self.season.clone(),
            null_sentinels: self.null_sentinels.clone(),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            extract: self.extract_options(),
            transform: self.transform_options(),
            alert_at_or_above: self.alert_at_or_above,
        }
    }
}
