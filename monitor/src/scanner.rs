//! Session scanning and liveness classification for tracked projects.
//!
//! For each tracked project the scanner lists the project's log directory,
//! stats every `<session-id>.jsonl` file and classifies the session from how
//! long ago the log was written (see [`SessionStatus::from_age`]).
//!
//! Absence is never an error here. A project whose log directory does not
//! exist (removed, or Claude Code has not run there yet) contributes zero
//! sessions, and a log file that disappears between listing and stat is
//! dropped from the result.
//!
//! # Ordering
//!
//! Results are sorted by project display name using ordinal (byte-wise,
//! case-sensitive) comparison, then by project path so that two projects
//! sharing a name stay in separate contiguous runs, then by modification
//! time descending, then by session id.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::path_codec::{project_log_dir, project_name};
use crate::store::PersistedState;
use crate::types::{DiscoveredSession, ProjectGroup, SessionStatus};
use crate::utils::session_filename::session_id_from_file_name;

/// A session log file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLog {
    /// Identifier derived from the file name.
    pub session_id: String,
    /// Absolute path of the log.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Lists the session logs in one project log directory.
///
/// Returns an empty list if the directory is missing or unreadable. Entries
/// whose metadata cannot be read are skipped.
#[must_use]
pub fn list_session_logs(log_dir: &Path) -> Vec<SessionLog> {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            trace!(dir = %log_dir.display(), "Log directory does not exist");
            return Vec::new();
        }
        Err(e) => {
            warn!(dir = %log_dir.display(), error = %e, "Failed to list log directory");
            return Vec::new();
        }
    };

    let mut logs = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(session_id) = file_name.to_str().and_then(session_id_from_file_name) else {
            continue;
        };

        let path = entry.path();
        let modified = match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.modified(),
            Ok(_) => continue,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Session log vanished during scan");
                continue;
            }
        };

        match modified {
            Ok(modified) => logs.push(SessionLog {
                session_id: session_id.to_string(),
                path,
                modified,
            }),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No modification time for session log");
            }
        }
    }

    logs
}

/// Time elapsed since `modified`, clamped to zero for timestamps in the future.
#[must_use]
pub fn age_at(now: SystemTime, modified: SystemTime) -> Duration {
    now.duration_since(modified).unwrap_or(Duration::ZERO)
}

/// Scans every tracked project for live, non-archived sessions.
///
/// `now` is the reference instant for liveness classification.
#[must_use]
pub fn scan_sessions(
    state: &PersistedState,
    projects_dir: &Path,
    now: SystemTime,
) -> Vec<DiscoveredSession> {
    let mut sessions = Vec::new();

    for project_path in &state.tracked_projects {
        let log_dir = project_log_dir(projects_dir, project_path);
        let name = project_name(project_path);

        for log in list_session_logs(&log_dir) {
            if state.is_session_archived(&log.session_id) {
                continue;
            }

            let status = SessionStatus::from_age(age_at(now, log.modified));
            sessions.push(DiscoveredSession {
                project_path: project_path.clone(),
                project_name: name.clone(),
                session_name: state.session_name(&log.session_id).map(str::to_string),
                session_id: log.session_id,
                log_path: log.path,
                modified: DateTime::<Utc>::from(log.modified),
                status,
            });
        }
    }

    sort_sessions(&mut sessions);

    debug!(
        projects = state.tracked_projects.len(),
        sessions = sessions.len(),
        "Scanned tracked projects"
    );

    sessions
}

/// Sorts sessions into display order.
pub fn sort_sessions(sessions: &mut [DiscoveredSession]) {
    sessions.sort_by(|a, b| {
        a.project_name
            .cmp(&b.project_name)
            .then_with(|| a.project_path.cmp(&b.project_path))
            .then_with(|| b.modified.cmp(&a.modified))
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
}

/// Groups sorted sessions by project, preserving order.
///
/// Each group's status is the most active status among its sessions.
#[must_use]
pub fn group_by_project(sessions: &[DiscoveredSession]) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = Vec::new();

    for session in sessions {
        match groups
            .iter_mut()
            .find(|g| g.project_path == session.project_path)
        {
            Some(group) => {
                group.status = group.status.max(session.status);
                group.sessions.push(session.clone());
            }
            None => groups.push(ProjectGroup {
                project_path: session.project_path.clone(),
                project_name: session.project_name.clone(),
                status: session.status,
                sessions: vec![session.clone()],
            }),
        }
    }

    groups
}
