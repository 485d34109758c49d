//! Handling of a second launch while this process holds the instance lock.
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

/// A window owned by the UI layer.
pub trait WindowHandle: Send + Sync {
    fn is_minimized(&self) -> bool;
    fn restore(&self) -> Result<()>;
    /// Shows the window and gives it input focus.
    fn show(&self) -> Result<()>;
}

/// Resolves the primary window. `None` is a normal answer: the window may not
/// exist yet, or may already be gone.
pub trait WindowProvider: Send + Sync {
    fn primary_window(&self) -> Option<Arc<dyn WindowHandle>>;
}

/// Application-level command-line processing, shared by first and later launches.
pub trait CommandLine: Send + Sync {
    fn process(&self, args: &[String]);

    /// Processes arguments that came from a launch started in `working_dir`.
    /// Implementations that resolve relative paths override this.
    fn process_in(&self, args: &[String], _working_dir: &Path) {
        self.process(args);
    }
}

/// Drops runtime/platform flags (`--...`), keeping application arguments in order.
pub fn application_args(argv: &[String]) -> Vec<String> {
    argv.iter()
        .filter(|arg| !arg.starts_with("--"))
        .cloned()
        .collect()
}

pub struct SecondInstanceHandler {
    windows: Arc<dyn WindowProvider>,
    command_line: Arc<dyn CommandLine>,
}

impl SecondInstanceHandler {
    pub fn new(windows: Arc<dyn WindowProvider>, command_line: Arc<dyn CommandLine>) -> Self {
        Self {
            windows,
            command_line,
        }
    }

    /// Brings the primary window forward, then re-dispatches `argv`.
    ///
    /// Each step is best-effort. When no window resolves the focus step is
    /// skipped without retry; the arguments are still dispatched.
    pub fn handle(&self, argv: &[String], working_dir: &Path) {
        info!(?argv, working_dir = %working_dir.display(), "second instance launched");

        self.focus_primary_window();

        let args = application_args(argv);
        debug!(?args, "dispatching second-instance arguments");
        self.command_line.process_in(&args, working_dir);
    }

    fn focus_primary_window(&self) {
        let Some(window) = self.windows.primary_window() else {
            debug!("no primary window yet; skipping focus");
            return;
        };

        if window.is_minimized() {
            if let Err(e) = window.restore() {
                warn!("failed to restore primary window: {e:#}");
            }
        }
        if let Err(e) = window.show() {
            warn!("failed to show primary window: {e:#}");
        }
    }
}
