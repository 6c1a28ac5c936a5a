//! Restart-safe debounce timer for coalescing bursts of events.
//!
//! A [`DebounceTimer`] holds at most one deadline. Every event re-arms it to
//! `now + quiet`; only when the deadline passes with no further events does
//! [`DebounceTimer::fire`] report `true`, clearing the timer. A burst of any
//! length therefore produces exactly one firing, one quiet period after its
//! last event.
//!
//! The timer is plain owned state with no background task. The owner
//! computes [`DebounceTimer::deadline`] before a `tokio::select!` and waits
//! on [`sleep_until_deadline`], which never completes for a disarmed timer.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use claudeboard_monitor::utils::debounce::DebounceTimer;
//!
//! let mut timer = DebounceTimer::new(Duration::from_secs(2));
//! let t0 = Instant::now();
//!
//! timer.arm(t0);
//! timer.arm(t0 + Duration::from_millis(500));
//!
//! assert!(!timer.fire(t0 + Duration::from_secs(2)));
//! assert!(timer.fire(t0 + Duration::from_millis(2500)));
//! assert!(!timer.is_armed());
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// A single-deadline debounce timer.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    /// Quiet period required after the last event.
    quiet: Duration,
    /// When the timer fires, if armed.
    deadline: Option<Instant>,
}

impl DebounceTimer {
    /// Creates a disarmed timer with the given quiet period.
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// The configured quiet period.
    #[must_use]
    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Arms the timer, or pushes an armed timer's deadline out to
    /// `now + quiet`.
    pub fn arm(&mut self, now: Instant) {
        let deadline = now + self.quiet;
        trace!(rearmed = self.deadline.is_some(), "Debounce timer armed");
        self.deadline = Some(deadline);
    }

    /// Disarms the timer without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns `true` if a firing is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if armed.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fires if the deadline has passed.
    ///
    /// Returns `true` exactly once per armed period and leaves the timer
    /// disarmed. Returns `false` if disarmed or not yet due.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Sleeps until `deadline`, or forever if there is none.
///
/// Intended as a `tokio::select!` branch for an optional timer.
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
