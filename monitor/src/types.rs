//! Shared types for ClaudeBoard session monitoring.
//!
//! These are the values handed to a presentation layer. Everything here is
//! rebuilt from the filesystem on every scan; nothing in this module is
//! persisted. All types serialize to camelCase JSON.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sessions modified more recently than this are working.
pub const WORKING_THRESHOLD: Duration = Duration::from_secs(30);

/// Sessions modified more recently than this (but not working) are idle.
pub const IDLE_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Number of identifier characters shown when a session has no custom name.
pub const SHORT_ID_LEN: usize = 8;

/// Liveness of a session, derived purely from log modification recency.
///
/// Variants are declared in ascending order of activity, so the derived
/// `Ord` ranks `Working > Idle > Stopped`. The maximum over a project's
/// sessions is that project's summary status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Stopped,
    Idle,
    Working,
}

impl SessionStatus {
    /// Classifies a session by the time elapsed since its log was last written.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use claudeboard_monitor::types::SessionStatus;
    ///
    /// assert_eq!(SessionStatus::from_age(Duration::from_secs(5)), SessionStatus::Working);
    /// assert_eq!(SessionStatus::from_age(Duration::from_secs(30)), SessionStatus::Idle);
    /// assert_eq!(SessionStatus::from_age(Duration::from_secs(300)), SessionStatus::Stopped);
    /// ```
    #[must_use]
    pub fn from_age(age: Duration) -> Self {
        if age < WORKING_THRESHOLD {
            Self::Working
        } else if age < IDLE_THRESHOLD {
            Self::Idle
        } else {
            Self::Stopped
        }
    }

    /// Lowercase label, identical to the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Idle => "idle",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live, non-archived session found under a tracked project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredSession {
    /// Absolute path of the tracked project.
    pub project_path: PathBuf,
    /// Last path segment of the project.
    pub project_name: String,
    /// Log file base name without the `.jsonl` suffix.
    pub session_id: String,
    /// Absolute path of the session log.
    pub log_path: PathBuf,
    /// Last modification time of the session log.
    pub modified: DateTime<Utc>,
    /// Liveness at scan time.
    pub status: SessionStatus,
    /// User-chosen label, if one is stored.
    pub session_name: Option<String>,
}

impl DiscoveredSession {
    /// Text to show for this session: the stored name, or a short identifier.
    #[must_use]
    pub fn display_name(&self) -> &str {
        display_name(self.session_name.as_deref(), &self.session_id)
    }
}

/// An untracked project proposed by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSuggestion {
    pub project_path: PathBuf,
    pub project_name: String,
}

/// An archived project with its derived display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedProject {
    pub project_path: PathBuf,
    pub project_name: String,
}

/// An archived session with metadata recovered from its log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedSession {
    pub project_path: PathBuf,
    pub project_name: String,
    pub session_id: String,
    pub log_path: PathBuf,
    pub modified: DateTime<Utc>,
    pub session_name: Option<String>,
}

impl ArchivedSession {
    /// Text to show for this session: the stored name, or a short identifier.
    #[must_use]
    pub fn display_name(&self) -> &str {
        display_name(self.session_name.as_deref(), &self.session_id)
    }
}

/// Everything hidden from the primary view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedView {
    pub archived_projects: Vec<ArchivedProject>,
    pub archived_sessions: Vec<ArchivedSession>,
}

/// Sessions of one project with the project's summary liveness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroup {
    pub project_path: PathBuf,
    pub project_name: String,
    /// Most active status among `sessions`.
    pub status: SessionStatus,
    pub sessions: Vec<DiscoveredSession>,
}

fn display_name<'a>(name: Option<&'a str>, session_id: &'a str) -> &'a str {
    match name {
        Some(name) if !name.is_empty() => name,
        _ => session_id
            .char_indices()
            .nth(SHORT_ID_LEN)
            .map_or(session_id, |(idx, _)| &session_id[..idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, name: Option<&str>) -> DiscoveredSession {
        DiscoveredSession {
            project_path: PathBuf::from("/repo/a"),
            project_name: "a".to_string(),
            session_id: id.to_string(),
            log_path: PathBuf::from(format!("/logs/-repo-a/{id}.jsonl")),
            modified: Utc::now(),
            status: SessionStatus::Working,
            session_name: name.map(str::to_string),
        }
    }

    #[test]
    fn status_boundaries_in_milliseconds() {
        let classify = |ms: u64| SessionStatus::from_age(Duration::from_millis(ms));

        assert_eq!(classify(0), SessionStatus::Working);
        assert_eq!(classify(29_999), SessionStatus::Working);
        assert_eq!(classify(30_000), SessionStatus::Idle);
        assert_eq!(classify(299_999), SessionStatus::Idle);
        assert_eq!(classify(300_000), SessionStatus::Stopped);
        assert_eq!(classify(86_400_000), SessionStatus::Stopped);
    }

    #[test]
    fn status_total_order() {
        assert!(SessionStatus::Working > SessionStatus::Idle);
        assert!(SessionStatus::Idle > SessionStatus::Stopped);
        let best = [SessionStatus::Idle, SessionStatus::Stopped, SessionStatus::Working]
            .into_iter()
            .max();
        assert_eq!(best, Some(SessionStatus::Working));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Working).unwrap(),
            "\"working\""
        );
        assert_eq!(SessionStatus::Stopped.to_string(), "stopped");
    }

    #[test]
    fn display_name_prefers_stored_name() {
        let s = session("6e45a55c-3124-4cc8-ad85-040a5c316009", Some("refactor"));
        assert_eq!(s.display_name(), "refactor");
    }

    #[test]
    fn display_name_falls_back_to_short_id() {
        let s = session("6e45a55c-3124-4cc8-ad85-040a5c316009", None);
        assert_eq!(s.display_name(), "6e45a55c");

        let short = session("abc", None);
        assert_eq!(short.display_name(), "abc");

        let empty_name = session("0123456789", Some(""));
        assert_eq!(empty_name.display_name(), "01234567");
    }

    #[test]
    fn discovered_session_serializes_camel_case() {
        let s = session("abc", Some("n"));
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["projectName"], "a");
        assert_eq!(json["sessionId"], "abc");
        assert_eq!(json["sessionName"], "n");
        assert_eq!(json["status"], "working");
    }
}
