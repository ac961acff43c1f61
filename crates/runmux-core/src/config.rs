//! Configuration management for runmux
//!
//! Configuration is a plain TOML file with three sections:
//!
//! ```toml
//! [view]
//! max_runs = 15
//!
//! [intake]
//! bind_addr = "127.0.0.1:0"
//!
//! [log]
//! level = "info"
//! format = "pretty"
//! ```
//!
//! Every field has a default; a missing file yields the default
//! configuration, while an unreadable or malformed file is an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default maximum number of runs retained in the history.
pub const DEFAULT_MAX_RUNS: usize = 15;

/// Default intake bind address (ephemeral localhost port).
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:0";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-friendly output for interactive use
    #[default]
    Pretty,
    /// JSON lines for CI and machine consumption
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: {s}. Expected pretty or json")),
        }
    }
}

/// View (run history) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Maximum number of runs retained; the oldest run is evicted beyond
    /// this bound.
    pub max_runs: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_runs: DEFAULT_MAX_RUNS,
        }
    }
}

/// Intake listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Address the intake listener binds to. Port 0 selects an ephemeral
    /// port; the bound port is exported to task launchers via
    /// [`crate::intake::INTAKE_PORT_ENV_VAR`].
    pub bind_addr: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error)
    /// Can be overridden by the RUST_LOG environment variable
    pub level: String,

    /// Output format (pretty or json)
    pub format: LogFormat,

    /// Optional path to a log file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Top-level runmux configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run history settings
    pub view: ViewConfig,
    /// Intake listener settings
    pub intake: IntakeConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from an explicit path, or from the platform
    /// default location when `path` is `None`.
    ///
    /// A missing file yields `Config::default()`. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_file(&path)
    }

    /// Load configuration from a file that must exist.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Platform default config path: `<config_dir>/runmux/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("runmux").join("config.toml"))
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view.max_runs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "view.max_runs".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Render the configuration as TOML.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
