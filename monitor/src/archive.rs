//! Archived projects and sessions, reconstructed on demand.
//!
//! Archival only records identifiers. File-backed metadata for an archived
//! session is recovered by re-listing the log directories of every tracked
//! and archived project. A session whose log no longer exists anywhere is
//! simply absent from the view; its identifier stays in the store as
//! harmless dead weight.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::path_codec::{project_log_dir, project_name};
use crate::scanner::list_session_logs;
use crate::store::PersistedState;
use crate::types::{ArchivedProject, ArchivedSession, ArchivedView};

/// Builds the archived projects and sessions view.
///
/// Archived projects keep store order. Archived sessions follow project
/// order (tracked first, then archived) and, within a project, most recently
/// modified first.
#[must_use]
pub fn get_archived(state: &PersistedState, projects_dir: &Path) -> ArchivedView {
    let archived_projects = state
        .archived_projects
        .iter()
        .map(|path| ArchivedProject {
            project_path: path.clone(),
            project_name: project_name(path),
        })
        .collect();

    let mut archived_sessions = Vec::new();
    if !state.archived_session_ids.is_empty() {
        let mut visited: HashSet<&Path> = HashSet::new();
        let mut found: HashSet<String> = HashSet::new();

        for project_path in state
            .tracked_projects
            .iter()
            .chain(state.archived_projects.iter())
        {
            if !visited.insert(project_path.as_path()) {
                continue;
            }

            let log_dir = project_log_dir(projects_dir, project_path);
            let mut logs: Vec<_> = list_session_logs(&log_dir)
                .into_iter()
                .filter(|log| state.is_session_archived(&log.session_id))
                .collect();
            logs.sort_by(|a, b| b.modified.cmp(&a.modified));

            for log in logs {
                // Colliding encodings can expose one log under two projects.
                if !found.insert(log.session_id.clone()) {
                    continue;
                }
                archived_sessions.push(ArchivedSession {
                    project_path: project_path.clone(),
                    project_name: project_name(project_path),
                    session_name: state.session_name(&log.session_id).map(str::to_string),
                    session_id: log.session_id,
                    log_path: log.path,
                    modified: DateTime::<Utc>::from(log.modified),
                });
            }
        }
    }

    debug!(
        projects = state.archived_projects.len(),
        sessions = archived_sessions.len(),
        "Built archived view"
    );

    ArchivedView {
        archived_projects,
        archived_sessions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan_sessions;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn write_log(projects_dir: &Path, dir_name: &str, id: &str, mtime: SystemTime) -> PathBuf {
        let dir = projects_dir.join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{id}.jsonl"));
        fs::write(&path, "{}\n").unwrap();
        set_file_mtime(&path, FileTime::from_system_time(mtime)).unwrap();
        path
    }

    fn setup() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let projects_dir = dir.path().join("projects");
        fs::create_dir_all(&projects_dir).unwrap();
        (dir, projects_dir)
    }

    #[test]
    fn archived_projects_projected_with_names() {
        let (_dir, projects_dir) = setup();
        let mut state = PersistedState::default();
        state.track_project(Path::new("/repo/a"));
        state.track_project(Path::new("/repo/b"));
        state.archive_project(Path::new("/repo/b"));

        let view = get_archived(&state, &projects_dir);
        assert_eq!(
            view.archived_projects,
            vec![ArchivedProject {
                project_path: PathBuf::from("/repo/b"),
                project_name: "b".to_string(),
            }]
        );
        assert!(view.archived_sessions.is_empty());
    }

    #[test]
    fn archive_moves_session_between_views() {
        let (_dir, projects_dir) = setup();
        let mtime = SystemTime::now() - Duration::from_secs(90);
        let log = write_log(&projects_dir, "-repo-a", "s1", mtime);
        write_log(&projects_dir, "-repo-a", "s2", mtime);

        let mut state = PersistedState::default();
        state.track_project(Path::new("/repo/a"));
        state.rename_session("s1", Some("spike"));

        let now = SystemTime::now();
        assert_eq!(scan_sessions(&state, &projects_dir, now).len(), 2);

        state.archive_session("s1");
        let live = scan_sessions(&state, &projects_dir, now);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].session_id, "s2");

        let view = get_archived(&state, &projects_dir);
        assert_eq!(view.archived_sessions.len(), 1);
        let archived = &view.archived_sessions[0];
        assert_eq!(archived.session_id, "s1");
        assert_eq!(archived.session_name.as_deref(), Some("spike"));
        assert_eq!(archived.log_path, log);
        assert_eq!(archived.modified, DateTime::<Utc>::from(mtime));
        assert_eq!(archived.project_path, Path::new("/repo/a"));

        state.unarchive_session("s1");
        let live = scan_sessions(&state, &projects_dir, now);
        let restored = live.iter().find(|s| s.session_id == "s1").unwrap();
        assert_eq!(restored.session_name.as_deref(), Some("spike"));
        assert!(get_archived(&state, &projects_dir).archived_sessions.is_empty());
    }

    #[test]
    fn sessions_of_archived_projects_are_found() {
        let (_dir, projects_dir) = setup();
        write_log(&projects_dir, "-repo-old", "s9", SystemTime::now());

        let mut state = PersistedState::default();
        state.track_project(Path::new("/repo/old"));
        state.archive_project(Path::new("/repo/old"));
        state.archive_session("s9");

        let view = get_archived(&state, &projects_dir);
        assert_eq!(view.archived_sessions.len(), 1);
        assert_eq!(view.archived_sessions[0].project_name, "old");
    }

    #[test]
    fn sessions_without_files_are_omitted() {
        let (_dir, projects_dir) = setup();
        let mut state = PersistedState::default();
        state.track_project(Path::new("/repo/a"));
        state.archive_session("deleted-session");

        let view = get_archived(&state, &projects_dir);
        assert!(view.archived_sessions.is_empty());
        assert!(state.is_session_archived("deleted-session"));
    }

    #[test]
    fn sessions_of_untracked_projects_are_not_found() {
        let (_dir, projects_dir) = setup();
        write_log(&projects_dir, "-repo-elsewhere", "s1", SystemTime::now());

        let mut state = PersistedState::default();
        state.archive_session("s1");

        assert!(get_archived(&state, &projects_dir).archived_sessions.is_empty());
    }

    #[test]
    fn colliding_encodings_report_session_once() {
        let (_dir, projects_dir) = setup();
        write_log(&projects_dir, "-home-u-my-app", "s1", SystemTime::now());

        let mut state = PersistedState::default();
        state.track_project(Path::new("/home/u/my-app"));
        state.track_project(Path::new("/home/u/my/app"));
        state.archive_session("s1");

        let view = get_archived(&state, &projects_dir);
        assert_eq!(view.archived_sessions.len(), 1);
        assert_eq!(view.archived_sessions[0].project_path, Path::new("/home/u/my-app"));
    }
}
