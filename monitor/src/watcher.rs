//! Watch coordinator: turns file system churn into "sessions changed" signals.
//!
//! # Architecture
//!
//! The coordinator owns one [`notify`] watcher per tracked project log
//! directory plus one on the directory holding the store file. Watcher
//! callbacks run on notify's own thread and stay lightweight: they classify
//! the event and `try_send` a marker through an internal channel to a single
//! tokio task, which owns every timer and the watch set itself.
//!
//! That task runs a `tokio::select!` loop over:
//!
//! - internal events, each of which (re)arms the shared debounce timer;
//!   store events additionally (re)arm the rebuild timer,
//! - the debounce deadline, which emits [`SessionsChanged::Debounced`],
//! - the rebuild deadline, which re-reads the tracked projects and replaces
//!   the entire watch set,
//! - a coarse fallback interval, which emits [`SessionsChanged::Fallback`]
//!   regardless of activity,
//! - control messages from the [`WatchHandle`].
//!
//! Log directories that do not exist yet, or that refuse a watch, are left
//! out of the set until the next rebuild. The store is watched through its
//! parent directory and filtered by file name, so saves that rename a
//! temporary file over the store are still observed.
//!
//! # Example
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use claudeboard_monitor::config::Config;
//! use claudeboard_monitor::store::Store;
//! use claudeboard_monitor::watcher::WatchCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let tracked = Store::new(&config.data_file).load().tracked_projects;
//!
//!     let (tx, mut rx) = mpsc::channel(1);
//!     let handle = WatchCoordinator::start(config, tracked, tx);
//!
//!     while let Some(change) = rx.recv().await {
//!         println!("sessions changed ({change:?}), re-scan");
//!     }
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::config::Config;
use crate::path_codec::project_log_dir;
use crate::store::Store;
use crate::utils::debounce::{sleep_until_deadline, DebounceTimer};
use crate::utils::session_filename::is_session_log;

/// Capacity of the channel between notify callbacks and the coordinator.
const INTERNAL_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the control channel.
const CONTROL_CHANNEL_CAPACITY: usize = 8;

/// Errors that can occur during file watching operations.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to initialize a file system watcher.
    #[error("failed to create watcher: {0}")]
    WatcherInit(#[from] notify::Error),

    /// The coordinator task is no longer running.
    #[error("coordinator channel closed")]
    ChannelClosed,
}

/// Result type for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Signal that the set of live sessions may have changed.
///
/// Carries no data: consumers re-scan on receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionsChanged {
    /// A burst of file system activity went quiet.
    Debounced,
    /// The periodic fallback timer elapsed.
    Fallback,
}

/// Lifecycle state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    /// No watches are active.
    #[default]
    Idle,
    /// Watches are established and events are being processed.
    Watching,
    /// The watch set is being torn down and re-established.
    Rebuilding,
}

/// Snapshot of what the coordinator is currently watching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchStatus {
    /// Current lifecycle state.
    pub state: CoordinatorState,
    /// Tracked projects whose log directory is under watch.
    pub watched_projects: Vec<PathBuf>,
    /// Whether the store file is under watch.
    pub store_watched: bool,
}

/// Events from notify callbacks, processed by the coordinator task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InternalEvent {
    /// A session log in a watched project directory changed.
    SessionLog,
    /// The store file changed.
    StoreChanged,
}

#[derive(Debug)]
enum Control {
    Rebuild,
    Shutdown,
}

/// The active set of watches. Dropping it stops every watch.
#[derive(Default)]
struct WatchSet {
    projects: Vec<(PathBuf, RecommendedWatcher)>,
    store: Option<RecommendedWatcher>,
}

impl WatchSet {
    fn status(&self, state: CoordinatorState) -> WatchStatus {
        WatchStatus {
            state,
            watched_projects: self.projects.iter().map(|(path, _)| path.clone()).collect(),
            store_watched: self.store.is_some(),
        }
    }

    fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.store.is_none()
    }
}

/// Entry point for starting the coordinator.
pub struct WatchCoordinator {
    config: Config,
    watches: WatchSet,
    events_tx: mpsc::Sender<InternalEvent>,
    events_rx: mpsc::Receiver<InternalEvent>,
    control_rx: mpsc::Receiver<Control>,
    notifications: mpsc::Sender<SessionsChanged>,
    status_tx: watch::Sender<WatchStatus>,
    debounce: DebounceTimer,
    rebuild: DebounceTimer,
}

impl WatchCoordinator {
    /// Establishes the initial watch set and spawns the coordinator task.
    ///
    /// Watches are in place by the time this returns. Must be called from
    /// within a tokio runtime.
    pub fn start(
        config: Config,
        tracked: Vec<PathBuf>,
        notifications: mpsc::Sender<SessionsChanged>,
    ) -> WatchHandle {
        let (events_tx, events_rx) = mpsc::channel(INTERNAL_CHANNEL_CAPACITY);
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(WatchStatus::default());

        let mut coordinator = Self {
            debounce: DebounceTimer::new(config.debounce),
            rebuild: DebounceTimer::new(config.rebuild_delay),
            config,
            watches: WatchSet::default(),
            events_tx,
            events_rx,
            control_rx,
            notifications,
            status_tx,
        };

        coordinator.watches = coordinator.establish(&tracked);
        coordinator.publish_settled();

        info!(
            projects = coordinator.watches.projects.len(),
            store = coordinator.watches.store.is_some(),
            "Watch coordinator started"
        );

        let task = tokio::spawn(coordinator.run());

        WatchHandle {
            control_tx,
            status_rx,
            task,
        }
    }

    async fn run(mut self) {
        let period = self.config.fallback_interval;
        let mut fallback = interval_at(Instant::now() + period, period);
        fallback.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let debounce_deadline = self.debounce.deadline();
            let rebuild_deadline = self.rebuild.deadline();

            tokio::select! {
                Some(event) = self.events_rx.recv() => {
                    self.on_event(event);
                }
                () = sleep_until_deadline(debounce_deadline) => {
                    if self.debounce.fire(Instant::now())
                        && !self.notify(SessionsChanged::Debounced)
                    {
                        break;
                    }
                }
                () = sleep_until_deadline(rebuild_deadline) => {
                    if self.rebuild.fire(Instant::now()) {
                        self.rebuild_watches();
                    }
                }
                _ = fallback.tick() => {
                    if !self.notify(SessionsChanged::Fallback) {
                        break;
                    }
                }
                control = self.control_rx.recv() => match control {
                    Some(Control::Rebuild) => self.rebuild_watches(),
                    Some(Control::Shutdown) | None => break,
                },
            }
        }

        self.watches = WatchSet::default();
        self.status_tx.send_replace(WatchStatus::default());
        info!("Watch coordinator stopped");
    }

    fn on_event(&mut self, event: InternalEvent) {
        let now = Instant::now();
        self.debounce.arm(now);
        if event == InternalEvent::StoreChanged {
            // Give a concurrent writer time to finish before re-reading.
            self.rebuild.arm(now);
        }
        trace!(?event, "Change event queued");
    }

    /// Sends a notification. Returns `false` once the consumer is gone.
    fn notify(&self, change: SessionsChanged) -> bool {
        match self.notifications.try_send(change) {
            Ok(()) => {
                debug!(?change, "Sessions changed");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!(?change, "Notification already pending");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Notification receiver dropped");
                false
            }
        }
    }

    /// Replaces the whole watch set from a fresh read of the store.
    fn rebuild_watches(&mut self) {
        let previous = self.watches.projects.len();
        self.publish(CoordinatorState::Rebuilding);

        self.watches = WatchSet::default();
        let tracked = Store::new(&self.config.data_file).load().tracked_projects;
        self.watches = self.establish(&tracked);
        self.publish_settled();

        info!(
            previous,
            projects = self.watches.projects.len(),
            "Rebuilt watch set"
        );
    }

    fn establish(&self, tracked: &[PathBuf]) -> WatchSet {
        let projects_dir = self.config.projects_dir();
        let mut set = WatchSet::default();

        for project_path in tracked {
            let log_dir = project_log_dir(&projects_dir, project_path);
            if !log_dir.is_dir() {
                debug!(dir = %log_dir.display(), "No log directory yet, skipping");
                continue;
            }

            let tx = self.events_tx.clone();
            let watcher = watch_directory(&log_dir, move |event| {
                if is_content_change(&event.kind) && event.paths.iter().any(|p| is_session_log(p)) {
                    queue(&tx, InternalEvent::SessionLog);
                }
            });

            match watcher {
                Ok(watcher) => set.projects.push((project_path.clone(), watcher)),
                Err(e) => {
                    warn!(dir = %log_dir.display(), error = %e, "Failed to watch log directory");
                }
            }
        }

        set.store = self.watch_store();
        set
    }

    fn watch_store(&self) -> Option<RecommendedWatcher> {
        let data_dir = self.config.data_dir();
        let Some(store_name) = self.config.data_file.file_name().map(OsString::from) else {
            warn!(path = %self.config.data_file.display(), "Store path has no file name");
            return None;
        };

        // The first save would create the directory unobserved.
        if let Err(e) = fs::create_dir_all(data_dir) {
            warn!(dir = %data_dir.display(), error = %e, "Failed to create store directory");
            return None;
        }

        let tx = self.events_tx.clone();
        let watcher = watch_directory(data_dir, move |event| {
            if is_content_change(&event.kind)
                && event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(store_name.as_os_str()))
            {
                queue(&tx, InternalEvent::StoreChanged);
            }
        });

        match watcher {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(dir = %data_dir.display(), error = %e, "Failed to watch store directory");
                None
            }
        }
    }

    fn publish(&self, state: CoordinatorState) {
        self.status_tx.send_replace(self.watches.status(state));
    }

    fn publish_settled(&self) {
        let state = if self.watches.is_empty() {
            CoordinatorState::Idle
        } else {
            CoordinatorState::Watching
        };
        self.publish(state);
    }
}

/// Handle on a running coordinator.
///
/// Dropping the handle also stops the coordinator, without waiting for it.
#[derive(Debug)]
pub struct WatchHandle {
    control_tx: mpsc::Sender<Control>,
    status_rx: watch::Receiver<WatchStatus>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Returns the current status snapshot.
    #[must_use]
    pub fn status(&self) -> WatchStatus {
        self.status_rx.borrow().clone()
    }

    /// Returns a receiver that observes every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WatchStatus> {
        self.status_rx.clone()
    }

    /// Asks the coordinator to re-read the store and rebuild its watch set.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::ChannelClosed`] if the coordinator has stopped.
    pub fn request_rebuild(&self) -> Result<()> {
        match self.control_tx.try_send(Control::Rebuild) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!("Rebuild already pending");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(WatcherError::ChannelClosed),
        }
    }

    /// Stops the coordinator and waits for every watch to be dropped.
    pub async fn shutdown(self) {
        if self.control_tx.send(Control::Shutdown).await.is_err() {
            debug!("Coordinator already stopped");
        }
        if let Err(e) = self.task.await {
            error!(error = %e, "Coordinator task failed");
        }
    }
}

/// Creates a non-recursive watcher on `dir` that forwards successful events
/// to `on_event`.
fn watch_directory<F>(dir: &Path, on_event: F) -> Result<RecommendedWatcher>
where
    F: Fn(Event) + Send + 'static,
{
    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| match res {
            Ok(event) => {
                trace!(kind = ?event.kind, paths = ?event.paths, "Received notify event");
                on_event(event);
            }
            Err(e) => error!(error = %e, "File watcher error"),
        },
        notify::Config::default(),
    )?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    debug!(dir = %dir.display(), "Started directory watch");
    Ok(watcher)
}

/// Access events are ignored; reading the store or a log must not look like
/// a change.
fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Forwards an event without blocking the notify thread.
fn queue(tx: &mpsc::Sender<InternalEvent>, event: InternalEvent) {
    // A full channel already holds events that will arm the same timers.
    if let Err(mpsc::error::TrySendError::Closed(_)) = tx.try_send(event) {
        trace!("Coordinator gone, dropping event");
    }
}
