//! Error types for the ClaudeBoard monitor.
//!
//! Most filesystem trouble in this crate is *expected*: project directories
//! that do not exist yet, session logs that vanish mid-scan, log lines that
//! are half-written. Those conditions are absorbed where they occur and never
//! become errors. What remains here are the failures a caller can actually
//! act on: a bad configuration, a store that cannot be written, a watcher
//! backend that cannot start, or a path that is not a directory.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::watcher::WatcherError;

/// Errors that can occur during monitor operations.
///
/// This is the primary error type for the monitor crate, encompassing all
/// possible failure modes.
///
/// # Examples
///
/// ```ignore
/// use claudeboard_monitor::error::MonitorError;
///
/// fn track(engine: &Engine, path: &Path) -> Result<(), MonitorError> {
///     engine.add_project(path)?;
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Persisting the store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// File watching error.
    #[error("file watch error: {0}")]
    Watch(#[from] WatcherError),

    /// A path that must be an existing directory is not one.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
