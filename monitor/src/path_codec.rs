//! Project path encoding used by Claude Code's log directory layout.
//!
//! Claude Code stores each project's session logs in a directory under
//! `~/.claude/projects/` whose name is the project's absolute path with every
//! path separator replaced by a dash:
//!
//! ```text
//! ~/.claude/projects/
//! +-- -home-ubuntu-Projects-VibeTea/
//! |   +-- 6e45a55c-3124-4cc8-ad85-040a5c316009.jsonl
//! +-- -home-ubuntu-Projects-SMILE/
//!     +-- 60fc5b5e-a285-4a6d-b9cc-9a315eb90ea8.jsonl
//! ```
//!
//! # Known limitation
//!
//! The encoding is lossy. `/home/u/my-app` and `/home/u/my/app` both map to
//! `-home-u-my-app`, so two such projects share one log directory and each
//! sees the other's sessions. This mirrors Claude Code's own convention and
//! is kept byte-for-byte so that the directories actually match. For the same
//! reason there is no decoder: discovery recovers real paths from log
//! content instead.

use std::path::{is_separator, Path, PathBuf};

/// Character substituted for each path separator.
pub const SEPARATOR_SUBSTITUTE: char = '-';

/// Encodes an absolute project path into its log directory name.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use claudeboard_monitor::path_codec::encode_project_path;
///
/// assert_eq!(
///     encode_project_path(Path::new("/home/ubuntu/Projects/VibeTea")),
///     "-home-ubuntu-Projects-VibeTea"
/// );
/// ```
#[must_use]
pub fn encode_project_path(project_path: &Path) -> String {
    project_path
        .to_string_lossy()
        .chars()
        .map(|c| if is_separator(c) { SEPARATOR_SUBSTITUTE } else { c })
        .collect()
}

/// Returns the log directory for a project under `projects_dir`.
#[must_use]
pub fn project_log_dir(projects_dir: &Path, project_path: &Path) -> PathBuf {
    projects_dir.join(encode_project_path(project_path))
}

/// Display name of a project: its last path segment.
///
/// Falls back to the whole path for paths without a final segment (`/`).
#[must_use]
pub fn project_name(project_path: &Path) -> String {
    project_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_standard_path() {
        assert_eq!(
            encode_project_path(Path::new("/home/ubuntu/Projects/VibeTea")),
            "-home-ubuntu-Projects-VibeTea"
        );
    }

    #[test]
    fn encode_root() {
        assert_eq!(encode_project_path(Path::new("/")), "-");
    }

    #[test]
    fn encode_keeps_existing_dashes() {
        assert_eq!(
            encode_project_path(Path::new("/home/user/my-project")),
            "-home-user-my-project"
        );
    }

    #[test]
    fn encode_collision_is_preserved() {
        // Both paths land in the same directory, exactly as Claude Code does.
        assert_eq!(
            encode_project_path(Path::new("/home/u/my-app")),
            encode_project_path(Path::new("/home/u/my/app"))
        );
    }

    #[test]
    fn encode_trailing_separator() {
        assert_eq!(
            encode_project_path(Path::new("/home/ubuntu/Projects/")),
            "-home-ubuntu-Projects-"
        );
    }

    #[test]
    fn encode_keeps_dots_and_spaces() {
        assert_eq!(
            encode_project_path(Path::new("/srv/my app/v1.2")),
            "-srv-my app-v1.2"
        );
    }

    #[test]
    fn log_dir_joins_encoded_name() {
        assert_eq!(
            project_log_dir(Path::new("/home/u/.claude/projects"), Path::new("/repo/a")),
            PathBuf::from("/home/u/.claude/projects/-repo-a")
        );
    }

    #[test]
    fn project_name_is_last_segment() {
        assert_eq!(project_name(Path::new("/home/user/code/claudeboard")), "claudeboard");
        assert_eq!(project_name(Path::new("/repo/a/")), "a");
        assert_eq!(project_name(Path::new("/")), "/");
    }
}
