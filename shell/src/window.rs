//! Primary window lookup and the headless library window.
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::{bail, Result};
use tracing::debug;

use crate::second_instance::{WindowHandle, WindowProvider};
use crate::status::{StatusBoard, WindowState};

#[derive(Debug, Default)]
struct WindowFlags {
    visible: bool,
    minimized: bool,
    focused: bool,
    closed: bool,
}

impl WindowFlags {
    fn published(&self) -> WindowState {
        if self.closed || !self.visible {
            WindowState::Hidden
        } else if self.minimized {
            WindowState::Minimized
        } else {
            WindowState::Visible
        }
    }
}

/// The library window, modeled without a toolkit. Every state change is
/// published to the status file for whichever UI front-end renders it.
pub struct LibraryWindow {
    flags: Mutex<WindowFlags>,
    board: Arc<StatusBoard>,
}

impl LibraryWindow {
    /// Opens the window visible and focused.
    pub fn open(board: Arc<StatusBoard>) -> Self {
        let window = Self {
            flags: Mutex::new(WindowFlags {
                visible: true,
                focused: true,
                ..WindowFlags::default()
            }),
            board,
        };
        window.publish();
        window
    }

    pub fn close(&self) {
        self.with_flags(|f| {
            f.closed = true;
            f.focused = false;
        });
        self.publish();
    }

    pub fn is_focused(&self) -> bool {
        self.with_flags(|f| f.focused)
    }

    pub fn is_closed(&self) -> bool {
        self.with_flags(|f| f.closed)
    }

    fn with_flags<R>(&self, f: impl FnOnce(&mut WindowFlags) -> R) -> R {
        let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut flags)
    }

    fn publish(&self) {
        let state = self.with_flags(|f| f.published());
        self.board.update(|s| s.window = state);
    }
}

impl WindowHandle for LibraryWindow {
    fn is_minimized(&self) -> bool {
        self.with_flags(|f| f.minimized)
    }

    fn restore(&self) -> Result<()> {
        if self.is_closed() {
            bail!("library window is closed");
        }
        self.with_flags(|f| {
            f.minimized = false;
            f.visible = true;
        });
        debug!("library window restored");
        self.publish();
        Ok(())
    }

    fn show(&self) -> Result<()> {
        if self.is_closed() {
            bail!("library window is closed");
        }
        self.with_flags(|f| {
            f.visible = true;
            f.focused = true;
        });
        debug!("library window shown");
        self.publish();
        Ok(())
    }
}

/// Where the primary window is looked up. Empty until the UI installs one.
#[derive(Default)]
pub struct WindowRegistry {
    slot: RwLock<Option<Arc<LibraryWindow>>>,
}

impl WindowRegistry {
    pub fn install(&self, window: Arc<LibraryWindow>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(window);
    }

    /// Removes and returns the installed window.
    pub fn take(&self) -> Option<Arc<LibraryWindow>> {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl WindowProvider for WindowRegistry {
    fn primary_window(&self) -> Option<Arc<dyn WindowHandle>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|w| !w.is_closed())
            .map(|w| Arc::clone(w) as Arc<dyn WindowHandle>)
    }
}
