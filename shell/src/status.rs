use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

/// Lifecycle of the primary process.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum ShellState {
    /// Lock acquired; the library window is not up yet and open requests are buffered.
    Starting,
    /// Consumers are attached and open requests are delivered as they arrive.
    Running,
    /// Shutdown requested.
    Stopped,
}

/// Visibility of the library window as last published.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Hidden,
    Minimized,
    Visible,
}

/// Runtime status written by the primary instance to `status.toml`.
/// External UIs read this file (read-only) to follow the shell.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShellStatus {
    /// Shell binary version (set from Cargo.toml at compile time).
    pub version: String,
    pub state: ShellState,
    pub window: WindowState,
    /// URI of the most recently delivered deep link, prefix stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_url: Option<String>,
    /// Path of the most recently delivered document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_file: Option<String>,
    /// RFC 3339 timestamp of the most recent delivery of either kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_at: Option<String>,
    /// Human-readable message for the last non-fatal error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShellStatus {
    /// Constructs the initial status right after the lock is acquired.
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: ShellState::Starting,
            window: WindowState::Hidden,
            last_opened_url: None,
            last_opened_file: None,
            last_opened_at: None,
            error: None,
        }
    }
}

/// Serializes `status` to TOML and writes it to `path`.
/// Creates the parent directory if it does not exist.
/// Failures are logged; a status write never takes the shell down.
pub fn write_status(path: &Path, status: &ShellStatus) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("failed to create status directory {}: {e}", parent.display());
            return;
        }
    }
    match toml::to_string_pretty(status) {
        Ok(content) => {
            if let Err(e) = std::fs::write(path, content) {
                warn!("failed to write status file: {e}");
            }
        }
        Err(e) => warn!("failed to serialize status: {e}"),
    }
}

/// Shared, write-through view of the status file.
///
/// The event loop and the library window both publish through it, from
/// different threads.
pub struct StatusBoard {
    path: PathBuf,
    status: Mutex<ShellStatus>,
}

impl StatusBoard {
    /// Writes the initial status to `path`.
    pub fn new(path: PathBuf) -> Self {
        let status = ShellStatus::new();
        write_status(&path, &status);
        Self {
            path,
            status: Mutex::new(status),
        }
    }

    /// Applies `f` and writes the result.
    pub fn update<F: FnOnce(&mut ShellStatus)>(&self, f: F) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut status);
        write_status(&self.path, &status);
    }

    pub fn snapshot(&self) -> ShellStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
