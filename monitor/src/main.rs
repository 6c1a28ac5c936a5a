//! ClaudeBoard - Claude Code session board.
//!
//! This binary tracks project directories and reports the Claude Code
//! sessions running in them.
//!
//! # Commands
//!
//! - `claudeboard add [PATH]`: Track a directory (default: current directory)
//! - `claudeboard sessions`: List live sessions grouped by project
//! - `claudeboard discover`: Suggest projects Claude Code has run in
//! - `claudeboard watch`: Re-print the session list whenever it changes
//!
//! # Environment Variables
//!
//! See `claudeboard_monitor::config` for available configuration options.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use claudeboard_monitor::config::Config;
use claudeboard_monitor::engine::{resolve_project_dir, Engine};
use claudeboard_monitor::error::MonitorError;
use claudeboard_monitor::scanner::group_by_project;
use claudeboard_monitor::types::{ArchivedView, DiscoveredSession};

/// ClaudeBoard - Claude Code session board.
///
/// Tracks project directories and shows which Claude Code sessions in them
/// are working, idle, or stopped.
#[derive(Parser, Debug)]
#[command(name = "claudeboard")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    CLAUDEBOARD_DATA_FILE         Store file (default: ~/.claudeboard.json)
    CLAUDEBOARD_CLAUDE_DIR        Claude directory (default: ~/.claude)
    CLAUDEBOARD_DEBOUNCE_MS       Quiet period before a refresh (default: 2000)
    CLAUDEBOARD_FALLBACK_SECS     Unconditional refresh period (default: 30)
    CLAUDEBOARD_REBUILD_DELAY_MS  Delay before re-reading the store (default: 500)

EXAMPLES:
    # Track the current directory
    claudeboard add

    # Show live sessions
    claudeboard sessions

    # Track everything Claude Code has been used in
    claudeboard discover

    # Keep the list up to date
    claudeboard watch
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Track a project directory.
    Add {
        /// Directory to track (default: current directory).
        path: Option<PathBuf>,
    },

    /// Stop tracking a project.
    Remove {
        /// Tracked project path.
        path: PathBuf,
    },

    /// Move a tracked project to the archive.
    Archive {
        /// Tracked project path.
        path: PathBuf,
    },

    /// Move an archived project back to the tracked list.
    Unarchive {
        /// Archived project path.
        path: PathBuf,
    },

    /// List live sessions grouped by project.
    Sessions {
        /// Print the raw session list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List archived projects and sessions.
    Archived {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Suggest untracked projects found in Claude Code's logs.
    Discover {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Hide a session from the live list.
    ArchiveSession {
        /// Session identifier.
        id: String,
    },

    /// Return an archived session to the live list.
    UnarchiveSession {
        /// Session identifier.
        id: String,
    },

    /// Set a session's display name, or clear it when NAME is omitted.
    Rename {
        /// Session identifier.
        id: String,
        /// New display name.
        name: Option<String>,
    },

    /// Re-print the session list whenever it changes.
    ///
    /// Runs until Ctrl+C or SIGTERM.
    Watch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    debug!(
        data_file = %config.data_file.display(),
        claude_dir = %config.claude_dir.display(),
        "Configuration loaded"
    );
    let engine = Engine::new(config);

    match cli.command {
        Command::Add { path } => run_add(&engine, path),
        Command::Remove { path } => {
            report(engine.remove_project(&path)?, "Removed", "Not tracked", &path);
            Ok(())
        }
        Command::Archive { path } => {
            report(engine.archive_project(&path)?, "Archived", "Not tracked", &path);
            Ok(())
        }
        Command::Unarchive { path } => {
            report(engine.unarchive_project(&path)?, "Unarchived", "Not archived", &path);
            Ok(())
        }
        Command::Sessions { json } => {
            let sessions = engine.scan_sessions();
            if json {
                print_json(&sessions)
            } else {
                print_sessions(&sessions);
                Ok(())
            }
        }
        Command::Archived { json } => {
            let view = engine.get_archived();
            if json {
                print_json(&view)
            } else {
                print_archived(&view);
                Ok(())
            }
        }
        Command::Discover { json } => {
            let suggestions = engine.discover_untracked();
            if json {
                return print_json(&suggestions);
            }
            if suggestions.is_empty() {
                println!("No untracked projects found.");
            }
            for suggestion in &suggestions {
                println!(
                    "{}  {}",
                    suggestion.project_name,
                    suggestion.project_path.display()
                );
            }
            Ok(())
        }
        Command::ArchiveSession { id } => {
            let changed = engine.archive_session(&id)?;
            println!("{}", session_outcome(changed, "Archived", "Already archived", &id));
            Ok(())
        }
        Command::UnarchiveSession { id } => {
            let changed = engine.unarchive_session(&id)?;
            println!("{}", session_outcome(changed, "Unarchived", "Not archived", &id));
            Ok(())
        }
        Command::Rename { id, name } => {
            engine.rename_session(&id, name.as_deref())?;
            match name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                Some(name) => println!("Renamed {id} to {name}"),
                None => println!("Cleared name of {id}"),
            }
            Ok(())
        }
        Command::Watch => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;

            runtime.block_on(run_watch(engine))
        }
    }
}

/// Tracks a directory, defaulting to the current one.
fn run_add(engine: &Engine, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let resolved = match resolve_project_dir(&path) {
        Ok(resolved) => resolved,
        Err(MonitorError::NotADirectory(shown)) => {
            eprintln!("Not a directory: {}", shown.display());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    engine.add_project_path(&resolved)?;
    println!("Tracking: {}", resolved.display());
    Ok(())
}

/// Runs the watch coordinator until a shutdown signal arrives.
async fn run_watch(engine: Engine) -> Result<()> {
    info!("Starting ClaudeBoard watch");

    // Capacity 1: one pending "re-scan" is all a consumer ever needs.
    let (tx, mut rx) = mpsc::channel(1);
    let handle = engine.watch(tx);

    print_sessions(&engine.scan_sessions());

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            change = rx.recv() => match change {
                Some(change) => {
                    debug!(?change, "Refreshing session list");
                    println!();
                    print_sessions(&engine.scan_sessions());
                }
                None => break,
            },
            () = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    handle.shutdown().await;
    info!("ClaudeBoard watch stopped");
    Ok(())
}

fn report(changed: bool, done: &str, skipped: &str, path: &Path) {
    println!("{}", outcome(changed, done, skipped, &path.display().to_string()));
}

fn session_outcome(changed: bool, done: &str, skipped: &str, id: &str) -> String {
    outcome(changed, done, skipped, &format!("session {id}"))
}

fn outcome(changed: bool, done: &str, skipped: &str, subject: &str) -> String {
    if changed {
        format!("{done}: {subject}")
    } else {
        format!("{skipped}: {subject}")
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn print_sessions(sessions: &[DiscoveredSession]) {
    if sessions.is_empty() {
        println!("No live sessions.");
        return;
    }

    for group in group_by_project(sessions) {
        println!("{} [{}]", group.project_name, group.status);
        for session in &group.sessions {
            println!("  {} · {}", session.display_name(), session.status);
        }
    }
}

fn print_archived(view: &ArchivedView) {
    println!("Archived projects:");
    if view.archived_projects.is_empty() {
        println!("  (none)");
    }
    for project in &view.archived_projects {
        println!("  {}  {}", project.project_name, project.project_path.display());
    }

    println!("Archived sessions:");
    if view.archived_sessions.is_empty() {
        println!("  (none)");
    }
    for session in &view.archived_sessions {
        println!("  {} · {}", session.display_name(), session.project_name);
    }
}

/// Initializes the logging subsystem.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_outcome_reflects_whether_store_changed() {
        assert_eq!(
            session_outcome(true, "Archived", "Already archived", "s1"),
            "Archived: session s1"
        );
        assert_eq!(
            session_outcome(false, "Archived", "Already archived", "s1"),
            "Already archived: session s1"
        );
        assert_eq!(
            session_outcome(false, "Unarchived", "Not archived", "s2"),
            "Not archived: session s2"
        );
    }

    #[test]
    fn project_outcome_shows_path() {
        let path = Path::new("/repo/app");
        assert_eq!(
            outcome(false, "Removed", "Not tracked", &path.display().to_string()),
            "Not tracked: /repo/app"
        );
    }
}
