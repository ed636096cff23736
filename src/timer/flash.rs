//! Post-countdown accent flashing

use crate::constants::FLASH_TOGGLE_COUNT;

/// Bounded toggle sequence; idle once the toggle budget is spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flash {
    remaining: u32,
    accent_on: bool,
}

impl Flash {
    /// Begin a new sequence, discarding any one in progress
    pub fn start(&mut self) {
        self.remaining = FLASH_TOGGLE_COUNT;
        self.accent_on = false;
    }

    /// Toggle the accent once; returns whether flashing continues
    pub fn step(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.accent_on = !self.accent_on;
        self.remaining -= 1;
        if self.remaining == 0 {
            self.accent_on = false;
            log::debug!("Flash sequence finished");
        }
        self.remaining > 0
    }

    pub fn stop(&mut self) {
        self.remaining = 0;
        self.accent_on = false;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn accent_visible(&self) -> bool {
        self.accent_on
    }
}
