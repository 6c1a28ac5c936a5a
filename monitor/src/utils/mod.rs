//! Utility modules for the ClaudeBoard monitor.
//!
//! # Modules
//!
//! - [`debounce`]: Restart-safe timer for coalescing bursts of file system events
//! - [`session_filename`]: Session log file name parsing

pub mod debounce;
pub mod session_filename;

pub use debounce::{sleep_until_deadline, DebounceTimer};
pub use session_filename::{is_session_log, session_id_from_path, SESSION_LOG_SUFFIX};
