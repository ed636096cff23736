//! Overlay window state
//!
//! Owned by the core facade and only touched from the UI thread, so no
//! locking is involved.

/// Lock, fullscreen and visibility flags of the overlay window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    /// Locked windows ignore the mouse (click-through)
    pub is_locked: bool,
    pub is_fullscreen: bool,
    pub is_visible: bool,
    /// Set by the quit action, consumed by the front end's event loop
    should_exit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            is_locked: false,
            is_fullscreen: false,
            is_visible: true,
            should_exit: false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.is_locked = locked;
        if locked {
            log::debug!("Window locked (click-through)");
        } else {
            log::debug!("Window unlocked");
        }
    }

    /// Returns the new lock state
    pub fn toggle_locked(&mut self) -> bool {
        self.set_locked(!self.is_locked);
        self.is_locked
    }

    /// Returns the new fullscreen state
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.is_fullscreen = !self.is_fullscreen;
        log::debug!("Fullscreen: {}", self.is_fullscreen);
        self.is_fullscreen
    }

    /// Returns the new visibility
    pub fn toggle_visible(&mut self) -> bool {
        self.is_visible = !self.is_visible;
        self.is_visible
    }

    /// Dragging the overlay is only possible when it takes mouse input and
    /// is not covering the screen
    pub fn can_drag(&self) -> bool {
        !self.is_locked && !self.is_fullscreen
    }

    /// Request that the application exit
    pub fn request_exit(&mut self) {
        self.should_exit = true;
    }

    /// Check if app should exit and clear the flag
    pub fn should_exit_and_clear(&mut self) -> bool {
        std::mem::take(&mut self.should_exit)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
