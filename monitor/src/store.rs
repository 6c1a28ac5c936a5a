//! Durable user intent: tracked projects, archived items and session names.
//!
//! The store is a single JSON document, by default `~/.claudeboard.json`:
//!
//! ```json
//! {
//!   "projects": ["/home/user/code/app"],
//!   "archivedProjects": ["/home/user/code/old"],
//!   "archivedSessions": ["6e45a55c-3124-4cc8-ad85-040a5c316009"],
//!   "sessionNames": { "60fc5b5e-a285-4a6d-b9cc-9a315eb90ea8": "refactor" }
//! }
//! ```
//!
//! There is no schema version. Loading is lenient field by field: a missing
//! or mistyped field becomes an empty container, and an unreadable or
//! malformed file yields a fully defaulted state. One normalization pass
//! then restores the invariants (no duplicates, tracked and archived
//! projects disjoint) before anything else sees the value.
//!
//! Liveness and existence are never stored here; they are re-derived from
//! the filesystem on every scan.
//!
//! Every mutation is load-modify-save. Saves replace the file atomically
//! through a temporary file in the same directory. There is no cross-process
//! locking: the last writer wins and other processes notice through their
//! filesystem watch.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::hash::Hash;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Errors that can occur while persisting the store.
///
/// Loading never fails; only saves report errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Writing or replacing the store file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The state could not be serialized (e.g. a non UTF-8 path).
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The fully populated persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistedState {
    /// Tracked project paths in insertion order.
    #[serde(rename = "projects")]
    pub tracked_projects: Vec<PathBuf>,

    /// Archived project paths, disjoint from `tracked_projects`.
    #[serde(rename = "archivedProjects")]
    pub archived_projects: Vec<PathBuf>,

    /// Archived session identifiers, independent of project archival.
    #[serde(rename = "archivedSessions")]
    pub archived_session_ids: Vec<String>,

    /// User-chosen session labels keyed by session identifier.
    #[serde(rename = "sessionNames")]
    pub session_display_names: BTreeMap<String, String>,
}

/// On-disk shape with every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawState {
    #[serde(default, deserialize_with = "lenient_strings")]
    projects: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_strings")]
    archived_projects: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_strings")]
    archived_sessions: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_names")]
    session_names: Option<BTreeMap<String, String>>,
}

/// Accepts any JSON value; an array keeps its non-empty string elements.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(None),
    };
    let strings = items
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Some(strings))
}

/// Accepts any JSON value; an object keeps its string-valued entries.
fn lenient_names<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries,
        _ => return Ok(None),
    };
    let names = entries
        .into_iter()
        .filter_map(|(id, name)| name.as_str().map(|name| (id, name.to_string())))
        .collect();
    Ok(Some(names))
}

fn into_paths(items: Option<Vec<String>>) -> Vec<PathBuf> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

impl RawState {
    /// Produces a state satisfying every store invariant.
    fn normalize(self) -> PersistedState {
        let archived_projects = dedup(into_paths(self.archived_projects));
        let archived: HashSet<&PathBuf> = archived_projects.iter().collect();

        // A path in both lists can only come from a torn concurrent write;
        // archival is the later intent in every mutation that touches both.
        let tracked_projects = dedup(into_paths(self.projects))
            .into_iter()
            .filter(|p| !archived.contains(p))
            .collect();

        let mut session_display_names = self.session_names.unwrap_or_default();
        session_display_names.retain(|_, name| !name.is_empty());

        PersistedState {
            tracked_projects,
            archived_session_ids: dedup(self.archived_sessions.unwrap_or_default()),
            session_display_names,
            archived_projects,
        }
    }
}

/// Removes duplicates, keeping the first occurrence.
fn dedup<T: Eq + Hash + Clone>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

impl PersistedState {
    /// Parses store content, healing anything missing or malformed.
    #[must_use]
    pub fn from_json(content: &str) -> Self {
        match serde_json::from_str::<RawState>(content) {
            Ok(raw) => raw.normalize(),
            Err(e) => {
                warn!(error = %e, "Malformed store content, using defaults");
                Self::default()
            }
        }
    }

    /// Returns `true` if the path is tracked.
    #[must_use]
    pub fn is_tracked(&self, project_path: &Path) -> bool {
        self.tracked_projects.iter().any(|p| p == project_path)
    }

    /// Returns `true` if the path is archived.
    #[must_use]
    pub fn is_project_archived(&self, project_path: &Path) -> bool {
        self.archived_projects.iter().any(|p| p == project_path)
    }

    /// Returns `true` if the session is archived.
    #[must_use]
    pub fn is_session_archived(&self, session_id: &str) -> bool {
        self.archived_session_ids.iter().any(|id| id == session_id)
    }

    /// Stored label for a session, if any.
    #[must_use]
    pub fn session_name(&self, session_id: &str) -> Option<&str> {
        self.session_display_names.get(session_id).map(String::as_str)
    }

    /// Appends a project to the tracked list.
    ///
    /// An archived path is moved back to tracked so the two lists stay
    /// disjoint. Returns `false` if the path was already tracked.
    pub fn track_project(&mut self, project_path: &Path) -> bool {
        if self.is_tracked(project_path) {
            return false;
        }
        self.archived_projects.retain(|p| p != project_path);
        self.tracked_projects.push(project_path.to_path_buf());
        true
    }

    /// Stops tracking a project. Returns `false` if it was not tracked.
    pub fn untrack_project(&mut self, project_path: &Path) -> bool {
        let before = self.tracked_projects.len();
        self.tracked_projects.retain(|p| p != project_path);
        self.tracked_projects.len() != before
    }

    /// Moves a tracked project to the archive.
    ///
    /// Untracked paths are left alone. Returns `false` if nothing changed.
    pub fn archive_project(&mut self, project_path: &Path) -> bool {
        if !self.untrack_project(project_path) {
            return false;
        }
        if !self.is_project_archived(project_path) {
            self.archived_projects.push(project_path.to_path_buf());
        }
        true
    }

    /// Moves an archived project back to the end of the tracked list.
    ///
    /// Paths that are not archived are left alone. Returns `false` if nothing
    /// changed.
    pub fn unarchive_project(&mut self, project_path: &Path) -> bool {
        let before = self.archived_projects.len();
        self.archived_projects.retain(|p| p != project_path);
        if self.archived_projects.len() == before {
            return false;
        }
        if !self.is_tracked(project_path) {
            self.tracked_projects.push(project_path.to_path_buf());
        }
        true
    }

    /// Archives a session. Returns `false` if it was already archived.
    pub fn archive_session(&mut self, session_id: &str) -> bool {
        if self.is_session_archived(session_id) {
            return false;
        }
        self.archived_session_ids.push(session_id.to_string());
        true
    }

    /// Unarchives a session. Returns `false` if it was not archived.
    pub fn unarchive_session(&mut self, session_id: &str) -> bool {
        let before = self.archived_session_ids.len();
        self.archived_session_ids.retain(|id| id != session_id);
        self.archived_session_ids.len() != before
    }

    /// Sets or clears a session label.
    ///
    /// The name is trimmed; `None` or a blank name removes the override.
    /// Returns `false` if the stored value did not change.
    pub fn rename_session(&mut self, session_id: &str, name: Option<&str>) -> bool {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => {
                if self.session_name(session_id) == Some(name) {
                    return false;
                }
                self.session_display_names
                    .insert(session_id.to_string(), name.to_string());
                true
            }
            None => self.session_display_names.remove(session_id).is_some(),
        }
    }
}

/// Handle on the store file.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Creates a store backed by the given file. Nothing is read yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the current state.
    ///
    /// Never fails: a missing, unreadable or malformed file yields the
    /// default state.
    #[must_use]
    pub fn load(&self) -> PersistedState {
        match fs::read_to_string(&self.path) {
            Ok(content) => PersistedState::from_json(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store file not found, using defaults");
                PersistedState::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read store, using defaults");
                PersistedState::default()
            }
        }
    }

    /// Writes the whole state, replacing the file atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized or the file cannot
    /// be written.
    pub fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        trace!(path = %self.path.display(), "Store saved");
        Ok(())
    }

    /// Loads, applies `mutate`, and saves if it reports a change.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails; the file is left untouched when
    /// `mutate` returns `false`.
    pub fn update<F>(&self, mutate: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut PersistedState) -> bool,
    {
        let mut state = self.load();
        if !mutate(&mut state) {
            return Ok(false);
        }
        self.save(&state)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, Store) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Store::new(dir.path().join("claudeboard.json"));
        (dir, store)
    }

    #[test]
    fn load_missing_file_returns_default() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load(), PersistedState::default());
    }

    #[test]
    fn load_invalid_json_returns_default() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();
        assert_eq!(store.load(), PersistedState::default());

        fs::write(store.path(), "[1, 2, 3]").unwrap();
        assert_eq!(store.load(), PersistedState::default());
    }

    #[test]
    fn load_heals_missing_fields() {
        let state = PersistedState::from_json(r#"{"projects": ["/repo/a"]}"#);
        assert_eq!(state.tracked_projects, vec![PathBuf::from("/repo/a")]);
        assert!(state.archived_projects.is_empty());
        assert!(state.archived_session_ids.is_empty());
        assert!(state.session_display_names.is_empty());
    }

    #[test]
    fn load_heals_mistyped_fields_individually() {
        let state = PersistedState::from_json(
            r#"{"projects": "oops", "archivedSessions": ["s1"], "sessionNames": null}"#,
        );
        assert!(state.tracked_projects.is_empty());
        assert_eq!(state.archived_session_ids, vec!["s1".to_string()]);
        assert!(state.session_display_names.is_empty());
    }

    #[test]
    fn load_keeps_valid_elements_beside_mistyped_ones() {
        let state = PersistedState::from_json(
            r#"{"projects": ["/repo/a", null, 3, "/repo/b"],
                "archivedSessions": [{"id": "x"}, "s1"],
                "sessionNames": {"s1": "auth", "s2": 7, "s3": null}}"#,
        );
        assert_eq!(
            state.tracked_projects,
            vec![PathBuf::from("/repo/a"), PathBuf::from("/repo/b")]
        );
        assert_eq!(state.archived_session_ids, vec!["s1".to_string()]);
        assert_eq!(state.session_name("s1"), Some("auth"));
        assert_eq!(state.session_display_names.len(), 1);
    }

    #[test]
    fn unrelated_update_preserves_entries_beside_mistyped_ones() {
        let (_dir, store) = temp_store();
        fs::write(
            store.path(),
            r#"{"projects": ["/repo/a", "/repo/b", null], "sessionNames": {"s1": "auth", "s2": 7}}"#,
        )
        .unwrap();

        assert!(store.update(|s| s.archive_session("x")).unwrap());

        let state = store.load();
        assert_eq!(
            state.tracked_projects,
            vec![PathBuf::from("/repo/a"), PathBuf::from("/repo/b")]
        );
        assert_eq!(state.session_name("s1"), Some("auth"));
        assert_eq!(state.archived_session_ids, vec!["x".to_string()]);

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk["projects"], serde_json::json!(["/repo/a", "/repo/b"]));
        assert_eq!(on_disk["sessionNames"], serde_json::json!({"s1": "auth"}));
    }

    #[test]
    fn load_ignores_unknown_fields() {
        let state = PersistedState::from_json(r#"{"projects": ["/a"], "theme": "dark"}"#);
        assert_eq!(state.tracked_projects, vec![PathBuf::from("/a")]);
    }

    #[test]
    fn normalize_removes_duplicates_and_overlap() {
        let state = PersistedState::from_json(
            r#"{
                "projects": ["/a", "/b", "/a", "/c"],
                "archivedProjects": ["/c", "/c"],
                "archivedSessions": ["s", "s"],
                "sessionNames": {"s": "", "t": "named"}
            }"#,
        );
        assert_eq!(
            state.tracked_projects,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert_eq!(state.archived_projects, vec![PathBuf::from("/c")]);
        assert_eq!(state.archived_session_ids, vec!["s".to_string()]);
        assert_eq!(state.session_name("t"), Some("named"));
        assert_eq!(state.session_name("s"), None);
    }

    #[test]
    fn save_load_roundtrip() {
        let (_dir, store) = temp_store();
        let mut state = PersistedState::default();
        state.track_project(Path::new("/repo/a"));
        state.track_project(Path::new("/repo/b"));
        state.track_project(Path::new("/repo/c"));
        state.archive_project(Path::new("/repo/c"));
        state.archive_session("s1");
        state.rename_session("s2", Some("feature work"));

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn save_uses_wire_field_names() {
        let (_dir, store) = temp_store();
        let mut state = PersistedState::default();
        state.track_project(Path::new("/repo/a"));
        state.rename_session("s1", Some("n"));
        store.save(&state).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(value["projects"][0], "/repo/a");
        assert!(value["archivedProjects"].as_array().unwrap().is_empty());
        assert!(value["archivedSessions"].as_array().unwrap().is_empty());
        assert_eq!(value["sessionNames"]["s1"], "n");
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("nested/deeper/board.json"));
        store.save(&PersistedState::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn update_skips_save_when_unchanged() {
        let (_dir, store) = temp_store();
        let changed = store.update(|s| s.untrack_project(Path::new("/nope"))).unwrap();
        assert!(!changed);
        assert!(!store.path().exists());

        let changed = store.update(|s| s.track_project(Path::new("/repo/a"))).unwrap();
        assert!(changed);
        assert!(store.load().is_tracked(Path::new("/repo/a")));
    }

    #[test]
    fn track_is_idempotent_and_ordered() {
        let mut state = PersistedState::default();
        assert!(state.track_project(Path::new("/b")));
        assert!(state.track_project(Path::new("/a")));
        assert!(!state.track_project(Path::new("/b")));
        assert_eq!(
            state.tracked_projects,
            vec![PathBuf::from("/b"), PathBuf::from("/a")]
        );
    }

    #[test]
    fn archive_requires_tracked() {
        let mut state = PersistedState::default();
        assert!(!state.archive_project(Path::new("/untracked")));
        assert!(state.archived_projects.is_empty());
    }

    #[test]
    fn archive_and_unarchive_keep_lists_disjoint() {
        let mut state = PersistedState::default();
        let p = Path::new("/repo/a");
        state.track_project(p);

        assert!(state.archive_project(p));
        assert!(!state.is_tracked(p));
        assert!(state.is_project_archived(p));
        assert!(!state.archive_project(p));

        assert!(state.unarchive_project(p));
        assert!(state.is_tracked(p));
        assert!(!state.is_project_archived(p));
        assert!(!state.unarchive_project(p));
    }

    #[test]
    fn tracking_an_archived_path_unarchives_it() {
        let mut state = PersistedState::default();
        let p = Path::new("/repo/a");
        state.track_project(p);
        state.archive_project(p);

        assert!(state.track_project(p));
        assert!(state.is_tracked(p));
        assert!(!state.is_project_archived(p));
    }

    #[test]
    fn disjointness_holds_over_operation_sequences() {
        let paths = [Path::new("/a"), Path::new("/b"), Path::new("/c")];
        let mut state = PersistedState::default();

        // Deterministic pseudo-random walk over all operations.
        let mut seed: u32 = 7;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let path = paths[(seed >> 8) as usize % paths.len()];
            match (seed >> 16) % 4 {
                0 => state.track_project(path),
                1 => state.untrack_project(path),
                2 => state.archive_project(path),
                _ => state.unarchive_project(path),
            };
            for p in paths {
                assert!(!(state.is_tracked(p) && state.is_project_archived(p)));
            }
            assert_eq!(dedup(state.tracked_projects.clone()), state.tracked_projects);
            assert_eq!(dedup(state.archived_projects.clone()), state.archived_projects);
        }
    }

    #[test]
    fn session_archive_is_idempotent() {
        let mut state = PersistedState::default();
        assert!(state.archive_session("s1"));
        assert!(!state.archive_session("s1"));
        assert!(state.is_session_archived("s1"));
        assert!(state.unarchive_session("s1"));
        assert!(!state.unarchive_session("s1"));
    }

    #[test]
    fn rename_sets_trims_and_clears() {
        let mut state = PersistedState::default();
        assert!(state.rename_session("s1", Some("  fix tests ")));
        assert_eq!(state.session_name("s1"), Some("fix tests"));
        assert!(!state.rename_session("s1", Some("fix tests")));

        assert!(state.rename_session("s1", Some("   ")));
        assert_eq!(state.session_name("s1"), None);

        state.rename_session("s1", Some("again"));
        assert!(state.rename_session("s1", None));
        assert!(!state.session_display_names.contains_key("s1"));
        assert!(!state.rename_session("s1", None));
    }
}
