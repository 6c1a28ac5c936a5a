//! Discovery of untracked projects from Claude Code's own log layout.
//!
//! Every project Claude Code has ever run in owns a directory under
//! `~/.claude/projects/`. Directory names are lossy encodings of the project
//! path (see [`crate::path_codec`]), so the real path is recovered from log
//! content instead: the first records of every session carry a `cwd` field.
//!
//! Only a bounded prefix of one log per directory is read. Malformed lines,
//! unreadable files and unreadable directories are skipped without aborting
//! the pass.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, trace};

use crate::path_codec::project_name;
use crate::store::PersistedState;
use crate::types::ProjectSuggestion;
use crate::utils::session_filename::session_id_from_file_name;

/// Number of leading bytes read when looking for a working-directory hint.
pub const CWD_PROBE_BYTES: u64 = 4096;

/// Record field holding the session's working directory.
const CWD_FIELD: &str = "cwd";

/// Extracts the working directory from the first records of a session log.
///
/// Reads at most [`CWD_PROBE_BYTES`] bytes. Returns the first non-empty `cwd`
/// string found on a parseable line, or `None`.
#[must_use]
pub fn extract_cwd(log_path: &Path) -> Option<PathBuf> {
    let file = match File::open(log_path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %log_path.display(), error = %e, "Failed to open session log");
            return None;
        }
    };

    let mut buf = Vec::with_capacity(CWD_PROBE_BYTES as usize);
    if let Err(e) = file.take(CWD_PROBE_BYTES).read_to_end(&mut buf) {
        debug!(path = %log_path.display(), error = %e, "Failed to read session log");
        return None;
    }

    cwd_from_prefix(&String::from_utf8_lossy(&buf))
}

/// Finds the first `cwd` value in newline-delimited JSON text.
///
/// The last line may be cut off by the probe limit; it then fails to parse
/// and is skipped like any other malformed line.
#[must_use]
pub fn cwd_from_prefix(content: &str) -> Option<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find_map(|record| {
            record
                .get(CWD_FIELD)
                .and_then(Value::as_str)
                .filter(|cwd| !cwd.is_empty())
                .map(PathBuf::from)
        })
}

/// Returns the first session log in a project log directory, in listing order.
fn first_session_log(log_dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(log_dir).ok()?;
    entries.flatten().find_map(|entry| {
        let name = entry.file_name();
        name.to_str().and_then(session_id_from_file_name)?;
        let path = entry.path();
        fs::metadata(&path)
            .is_ok_and(|meta| meta.is_file())
            .then_some(path)
    })
}

/// Proposes projects Claude Code has run in that are neither tracked nor
/// archived.
///
/// Results follow directory listing order and contain no duplicates. Every
/// returned path existed on disk when checked.
#[must_use]
pub fn discover_untracked(state: &PersistedState, projects_dir: &Path) -> Vec<ProjectSuggestion> {
    let entries = match fs::read_dir(projects_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %projects_dir.display(), error = %e, "Cannot list projects root");
            return Vec::new();
        }
    };

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut suggestions = Vec::new();

    for entry in entries.flatten() {
        let log_dir = entry.path();
        if !log_dir.is_dir() {
            continue;
        }

        let Some(log_path) = first_session_log(&log_dir) else {
            trace!(dir = %log_dir.display(), "No session log in directory");
            continue;
        };

        let Some(project_path) = extract_cwd(&log_path) else {
            trace!(path = %log_path.display(), "No working directory hint in log");
            continue;
        };

        if state.is_tracked(&project_path)
            || state.is_project_archived(&project_path)
            || !seen.insert(project_path.clone())
        {
            continue;
        }

        if !project_path.exists() {
            trace!(path = %project_path.display(), "Skipping stale project path");
            continue;
        }

        suggestions.push(ProjectSuggestion {
            project_name: project_name(&project_path),
            project_path,
        });
    }

    debug!(count = suggestions.len(), "Discovered untracked projects");

    suggestions
}
