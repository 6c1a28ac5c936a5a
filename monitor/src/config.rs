//! Configuration module for the ClaudeBoard monitor.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `CLAUDEBOARD_DATA_FILE` | No | `~/.claudeboard.json` | Persisted tracked/archived state |
//! | `CLAUDEBOARD_CLAUDE_DIR` | No | `~/.claude` | Claude Code directory (logs live in `projects/`) |
//! | `CLAUDEBOARD_DEBOUNCE_MS` | No | 2000 | Quiet period before a change notification |
//! | `CLAUDEBOARD_FALLBACK_SECS` | No | 30 | Unconditional notification period |
//! | `CLAUDEBOARD_REBUILD_DELAY_MS` | No | 500 | Delay between a store change and the watch rebuild |
//!
//! # Example
//!
//! ```no_run
//! use claudeboard_monitor::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Store: {}", config.data_file.display());
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use thiserror::Error;

/// Default store file name relative to home.
const DEFAULT_DATA_FILE: &str = ".claudeboard.json";

/// Default Claude Code directory name relative to home.
const DEFAULT_CLAUDE_DIR: &str = ".claude";

/// Subdirectory of the Claude Code directory holding per-project session logs.
const PROJECTS_SUBDIR: &str = "projects";

/// Default debounce quiet period in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 2_000;

/// Default fallback notification period in seconds.
pub const DEFAULT_FALLBACK_SECS: u64 = 30;

/// Default delay before rebuilding watches after a store change, in milliseconds.
pub const DEFAULT_REBUILD_DELAY_MS: u64 = 500;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for the ClaudeBoard monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the JSON store holding tracked projects and annotations.
    pub data_file: PathBuf,

    /// Path to the Claude Code directory.
    pub claude_dir: PathBuf,

    /// Quiet period that must elapse with no qualifying event before a
    /// change notification is emitted.
    pub debounce: Duration,

    /// Period of the unconditional fallback notification.
    pub fallback_interval: Duration,

    /// Delay between a store file event and the watch set rebuild, giving a
    /// concurrent writer time to finish.
    pub rebuild_delay: Duration,
}

impl Config {
    /// Creates a configuration for explicit paths with default timings.
    #[must_use]
    pub fn new(data_file: impl Into<PathBuf>, claude_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            claude_dir: claude_dir.into(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            fallback_interval: Duration::from_secs(DEFAULT_FALLBACK_SECS),
            rebuild_delay: Duration::from_millis(DEFAULT_REBUILD_DELAY_MS),
        }
    }

    /// Overrides the debounce quiet period.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Overrides the fallback notification period.
    #[must_use]
    pub fn with_fallback_interval(mut self, interval: Duration) -> Self {
        self.fallback_interval = interval;
        self
    }

    /// Overrides the store-change rebuild delay.
    #[must_use]
    pub fn with_rebuild_delay(mut self, delay: Duration) -> Self {
        self.rebuild_delay = delay;
        self
    }

    /// Root directory containing one log directory per project.
    #[must_use]
    pub fn projects_dir(&self) -> PathBuf {
        self.claude_dir.join(PROJECTS_SUBDIR)
    }

    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - The home directory cannot be determined (needed for default paths)
    /// - A timing variable is set but is not a positive integer
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
        let home_dir = base_dirs.home_dir();

        let data_file = env::var("CLAUDEBOARD_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir.join(DEFAULT_DATA_FILE));

        let claude_dir = env::var("CLAUDEBOARD_CLAUDE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir.join(DEFAULT_CLAUDE_DIR));

        let debounce = Duration::from_millis(parse_positive(
            "CLAUDEBOARD_DEBOUNCE_MS",
            DEFAULT_DEBOUNCE_MS,
        )?);
        let fallback_interval = Duration::from_secs(parse_positive(
            "CLAUDEBOARD_FALLBACK_SECS",
            DEFAULT_FALLBACK_SECS,
        )?);
        let rebuild_delay = Duration::from_millis(parse_positive(
            "CLAUDEBOARD_REBUILD_DELAY_MS",
            DEFAULT_REBUILD_DELAY_MS,
        )?);

        Ok(Self {
            data_file,
            claude_dir,
            debounce,
            fallback_interval,
            rebuild_delay,
        })
    }

    /// Returns the directory holding the store file.
    ///
    /// The store is watched through this directory so that atomic
    /// rename-over saves remain visible.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        match self.data_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// Parses an optional positive integer variable, falling back to `default`.
fn parse_positive(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(val) => {
            let parsed = val
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("expected positive integer, got '{val}'"),
                })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "value must be greater than 0".to_string(),
                });
            }
            Ok(parsed)
        }
        Err(_) => Ok(default),
    }
}
