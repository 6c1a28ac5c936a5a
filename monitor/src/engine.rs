//! High-level facade over the store, the scanners and the watch coordinator.
//!
//! [`Engine`] is what a presentation layer talks to. Every read re-derives
//! its answer from the store file and the log directories; every mutation is
//! a single load-modify-save of the store that returns whether anything
//! changed. Nothing is cached between calls.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::sync::mpsc;
use tracing::info;

use crate::archive;
use crate::config::Config;
use crate::discovery;
use crate::error::{MonitorError, Result};
use crate::scanner;
use crate::store::{PersistedState, Store};
use crate::types::{ArchivedView, DiscoveredSession, ProjectGroup, ProjectSuggestion};
use crate::watcher::{SessionsChanged, WatchCoordinator, WatchHandle};

/// Resolves `path` to an absolute, existing directory.
///
/// Symlinks and `..` components are resolved so the result matches the
/// working directory Claude Code records for the project.
///
/// # Errors
///
/// Returns [`MonitorError::NotADirectory`] if the path does not exist or is
/// not a directory.
pub fn resolve_project_dir(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) if resolved.is_dir() => Ok(resolved),
        _ => {
            let shown = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
            Err(MonitorError::NotADirectory(shown))
        }
    }
}

/// Session monitoring engine bound to one store file and one log root.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    store: Store,
}

impl Engine {
    /// Creates an engine for the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let store = Store::new(&config.data_file);
        Self { config, store }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Loads the current persisted state.
    #[must_use]
    pub fn state(&self) -> PersistedState {
        self.store.load()
    }

    /// Live, non-archived sessions of every tracked project, in display order.
    #[must_use]
    pub fn scan_sessions(&self) -> Vec<DiscoveredSession> {
        scanner::scan_sessions(&self.state(), &self.config.projects_dir(), SystemTime::now())
    }

    /// [`Engine::scan_sessions`] grouped by project.
    #[must_use]
    pub fn scan_groups(&self) -> Vec<ProjectGroup> {
        scanner::group_by_project(&self.scan_sessions())
    }

    /// Archived projects and the archived sessions that still have a log.
    #[must_use]
    pub fn get_archived(&self) -> ArchivedView {
        archive::get_archived(&self.state(), &self.config.projects_dir())
    }

    /// Projects Claude Code has run in that are neither tracked nor archived.
    #[must_use]
    pub fn discover_untracked(&self) -> Vec<ProjectSuggestion> {
        discovery::discover_untracked(&self.state(), &self.config.projects_dir())
    }

    /// Tracks an existing directory.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotADirectory`] if `path` is not an existing
    /// directory, or a store error if saving fails.
    pub fn add_project(&self, path: &Path) -> Result<bool> {
        let resolved = resolve_project_dir(path)?;
        self.add_project_path(&resolved)
    }

    /// Tracks a path as given, without checking it.
    ///
    /// Used to accept suggestions from [`Engine::discover_untracked`], whose
    /// paths were already checked.
    ///
    /// # Errors
    ///
    /// Returns an error if saving the store fails.
    pub fn add_project_path(&self, path: &Path) -> Result<bool> {
        let changed = self.store.update(|state| state.track_project(path))?;
        if changed {
            info!(path = %path.display(), "Tracking project");
        }
        Ok(changed)
    }

    /// Stops tracking a project. Its sessions and names are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if saving the store fails.
    pub fn remove_project(&self, path: &Path) -> Result<bool> {
        let changed = self.store.update(|state| state.untrack_project(path))?;
        if changed {
            info!(path = %path.display(), "Removed project");
        }
        Ok(changed)
    }

    /// Moves a tracked project to the archive. No-op if it is not tracked.
    ///
    /// # Errors
    ///
    /// Returns an error if saving the store fails.
    pub fn archive_project(&self, path: &Path) -> Result<bool> {
        let changed = self.store.update(|state| state.archive_project(path))?;
        if changed {
            info!(path = %path.display(), "Archived project");
        }
        Ok(changed)
    }

    /// Moves an archived project back to the tracked list. No-op if it is
    /// not archived.
    ///
    /// # Errors
    ///
    /// Returns an error if saving the store fails.
    pub fn unarchive_project(&self, path: &Path) -> Result<bool> {
        let changed = self.store.update(|state| state.unarchive_project(path))?;
        if changed {
            info!(path = %path.display(), "Unarchived project");
        }
        Ok(changed)
    }

    /// Hides a session from the live view.
    ///
    /// # Errors
    ///
    /// Returns an error if saving the store fails.
    pub fn archive_session(&self, session_id: &str) -> Result<bool> {
        let changed = self.store.update(|state| state.archive_session(session_id))?;
        if changed {
            info!(session_id, "Archived session");
        }
        Ok(changed)
    }

    /// Returns an archived session to the live view.
    ///
    /// # Errors
    ///
    /// Returns an error if saving the store fails.
    pub fn unarchive_session(&self, session_id: &str) -> Result<bool> {
        let changed = self.store.update(|state| state.unarchive_session(session_id))?;
        if changed {
            info!(session_id, "Unarchived session");
        }
        Ok(changed)
    }

    /// Sets or clears a session's display name.
    ///
    /// The name is trimmed; `None` or a blank name clears the override.
    ///
    /// # Errors
    ///
    /// Returns an error if saving the store fails.
    pub fn rename_session(&self, session_id: &str, name: Option<&str>) -> Result<bool> {
        let changed = self.store.update(|state| state.rename_session(session_id, name))?;
        if changed {
            info!(session_id, name = name.unwrap_or_default(), "Renamed session");
        }
        Ok(changed)
    }

    /// Starts a watch coordinator over the currently tracked projects.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch(&self, notifications: mpsc::Sender<SessionsChanged>) -> WatchHandle {
        let tracked = self.state().tracked_projects;
        WatchCoordinator::start(self.config.clone(), tracked, notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_files_and_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            resolve_project_dir(&file),
            Err(MonitorError::NotADirectory(p)) if p == file
        ));
        assert!(matches!(
            resolve_project_dir(&dir.path().join("missing")),
            Err(MonitorError::NotADirectory(_))
        ));
    }

    #[test]
    fn resolve_normalizes_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let resolved = resolve_project_dir(&nested.join("..")).unwrap();
        assert_eq!(resolved, fs::canonicalize(dir.path().join("a")).unwrap());
    }
}
