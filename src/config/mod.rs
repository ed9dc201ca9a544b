//! Configuration for the reporter, loaded from JSON.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default config file path.
pub const CONFIG_FILE: &str = ".probe-report.json";

/// Default status redraw interval in milliseconds.
pub const DEFAULT_REFRESH_MS: u64 = 100;

fn default_refresh_ms() -> u64 {
    DEFAULT_REFRESH_MS
}

/// Reporter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Mirror the transcript into this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Status codes hidden from the transcript.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hide_status: Vec<u16>,
    /// Hide failed probes from the transcript.
    #[serde(default)]
    pub hide_errors: bool,
    /// Status region redraw interval in milliseconds.
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            hide_status: Vec::new(),
            hide_errors: false,
            refresh_ms: DEFAULT_REFRESH_MS,
        }
    }
}

/// Error type for config operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading the config file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Error parsing the config file JSON.
    #[error("Failed to parse config JSON: {0}")]
    ParseError(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Field name.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Command-line overrides applied on top of the file config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Log file path.
    pub log_file: Option<PathBuf>,
    /// Extra status codes to hide.
    pub hide_status: Vec<u16>,
    /// Hide failed probes.
    pub hide_errors: bool,
    /// Redraw interval.
    pub refresh_ms: Option<u64>,
}

impl ReporterConfig {
    /// Load configuration from a file, or return defaults if the file doesn't exist.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to config file. Defaults to `.probe-report.json` if None.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let config: ReporterConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides. Status codes are merged, the rest replace.
    pub fn merge(mut self, overrides: Overrides) -> Self {
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
        for code in overrides.hide_status {
            if !self.hide_status.contains(&code) {
                self.hide_status.push(code);
            }
        }
        self.hide_errors |= overrides.hide_errors;
        if let Some(ms) = overrides.refresh_ms {
            self.refresh_ms = ms;
        }
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "refresh_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
