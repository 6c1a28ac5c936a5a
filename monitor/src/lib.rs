//! ClaudeBoard Monitor - Claude Code session discovery and watching.
//!
//! This crate finds the Claude Code sessions belonging to a user-chosen set
//! of project directories, classifies each as working, idle or stopped from
//! its log's modification time, and signals consumers when that picture
//! may have changed.
//!
//! # Overview
//!
//! Claude Code writes one append-only `<session-id>.jsonl` log per session
//! under `~/.claude/projects/<encoded-project-path>/`. The monitor never
//! writes there. Its own state (tracked and archived projects, archived
//! sessions, display names) lives in a small JSON store, by default
//! `~/.claudeboard.json`. Everything else is re-derived from the filesystem
//! on every read.
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types for monitor operations
//! - [`types`]: Session, project and liveness types
//! - [`path_codec`]: Project path to log directory name encoding
//! - [`store`]: Persisted user intent
//! - [`scanner`]: Live session scanning, sorting and grouping
//! - [`discovery`]: Untracked project suggestions
//! - [`archive`]: Archived projects and sessions view
//! - [`watcher`]: Debounced change notifications from file system events
//! - [`engine`]: Facade tying the above together
//! - [`utils`]: Shared utilities (debouncing, session file names)

pub mod archive;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod path_codec;
pub mod scanner;
pub mod store;
pub mod types;
pub mod utils;
pub mod watcher;

pub use config::Config;
pub use engine::Engine;
pub use error::{MonitorError, Result};
pub use store::{PersistedState, Store, StoreError};
pub use types::{
    ArchivedProject, ArchivedSession, ArchivedView, DiscoveredSession, ProjectGroup,
    ProjectSuggestion, SessionStatus,
};
pub use watcher::{
    CoordinatorState, SessionsChanged, WatchCoordinator, WatchHandle, WatchStatus, WatcherError,
};
