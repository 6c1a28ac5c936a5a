//! Session log filename helpers.
//!
//! Claude Code writes one append-only log per session:
//! `~/.claude/projects/<encoded-project-path>/<session-id>.jsonl`
//!
//! The session identifier is the file name with the suffix stripped. No
//! particular identifier format is assumed; any non-empty base name counts.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use claudeboard_monitor::utils::session_filename::{is_session_log, session_id_from_path};
//!
//! let path = Path::new("/home/user/.claude/projects/-home-user-myproject/6e45a55c-3124-4cc8-ad85-040a5c316009.jsonl");
//! assert!(is_session_log(path));
//! assert_eq!(
//!     session_id_from_path(path).as_deref(),
//!     Some("6e45a55c-3124-4cc8-ad85-040a5c316009")
//! );
//! ```

use std::path::Path;

/// Suffix carried by every session log file.
pub const SESSION_LOG_SUFFIX: &str = ".jsonl";

/// Extracts the session identifier from a log file name.
///
/// Returns `None` when the name lacks the session-log suffix or when nothing
/// remains after stripping it.
///
/// # Examples
///
/// ```
/// use claudeboard_monitor::utils::session_filename::session_id_from_file_name;
///
/// assert_eq!(session_id_from_file_name("abc.jsonl"), Some("abc"));
/// assert_eq!(session_id_from_file_name("abc.json"), None);
/// assert_eq!(session_id_from_file_name(".jsonl"), None);
/// ```
#[must_use]
pub fn session_id_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(SESSION_LOG_SUFFIX)
        .filter(|id| !id.is_empty())
}

/// Extracts the session identifier from a log file path.
#[must_use]
pub fn session_id_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    session_id_from_file_name(file_name).map(str::to_string)
}

/// Returns `true` if the path names a session log file.
#[must_use]
pub fn is_session_log(path: &Path) -> bool {
    session_id_from_path(path).is_some()
}
