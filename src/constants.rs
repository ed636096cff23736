//! Centralized constants for DeskTimer
//!
//! This module contains all tunable numerical values used throughout
//! the application. Each constant includes documentation on its purpose,
//! unit, and recommended value range.

// ============================================================================
// TIMEKEEPING
// ============================================================================

/// Interval between timer ticks.
/// Unit: milliseconds
/// Range: Fixed, the counter moves by exactly one second per tick
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Interval between accent toggles while flashing after a countdown.
/// Unit: milliseconds
/// Recommended range: 250-1000
pub const FLASH_INTERVAL_MS: u64 = 500;

/// Number of accent toggles per flash sequence (6 toggles = 3 full flashes).
/// Unit: toggles
/// Range: Keep even so the overlay ends on its normal colour
pub const FLASH_TOGGLE_COUNT: u32 = 6;

// ============================================================================
// SETTINGS PERSISTENCE
// ============================================================================

/// Debounce window for programmatic settings changes.
/// Unit: milliseconds
/// Recommended range: 500-3000 (coalesces bursts, short enough to survive a crash)
pub const SETTINGS_SAVE_DELAY_MS: u64 = 1000;

/// Directory (under the base dir) holding the settings document.
pub const SETTINGS_DIR_NAME: &str = "settings";

/// Directory (under the base dir) holding alarm sounds.
pub const SOUNDS_DIR_NAME: &str = "sounds";

/// File name of the settings document.
pub const SETTINGS_FILE_NAME: &str = "timer_settings.json";

/// Directory (under the base dir) holding optional translation overrides.
pub const LANG_DIR_NAME: &str = "lang";

/// Directory name used under the platform config dir when the exe dir is unknown.
pub const APP_DIR_NAME: &str = "desktimer";

// ============================================================================
// SETTINGS RANGES
// ============================================================================

/// Font size limits for the overlay text.
/// Unit: points
pub const FONT_SIZE_MIN: i64 = 12;
pub const FONT_SIZE_MAX: i64 = 500;
pub const FONT_SIZE_DEFAULT: i64 = 96;

/// Background opacity limits.
/// Unit: alpha channel (0 = transparent, 255 = opaque)
pub const BG_OPACITY_MIN: i64 = 0;
pub const BG_OPACITY_MAX: i64 = 255;
pub const BG_OPACITY_DEFAULT: i64 = 200;

/// Alarm volume limits.
/// Unit: percent
pub const SOUND_VOLUME_MIN: i64 = 0;
pub const SOUND_VOLUME_MAX: i64 = 100;
pub const SOUND_VOLUME_DEFAULT: i64 = 80;

/// Countdown field limits.
/// Unit: hours / minutes / seconds
pub const COUNTDOWN_HOURS_MAX: i64 = 99;
pub const COUNTDOWN_MINUTES_MAX: i64 = 59;
pub const COUNTDOWN_SECONDS_MAX: i64 = 59;

// ============================================================================
// NOTIFICATION TIMEOUTS
// ============================================================================

/// Short notification display duration (lock/unlock, pause/resume).
/// Unit: milliseconds
pub const NOTIFICATION_SHORT_MS: u32 = 3000;

/// Countdown-finished notification display duration.
/// Unit: milliseconds
pub const NOTIFICATION_LONG_MS: u32 = 5000;

/// Tray balloon duration for minor status messages.
/// Unit: milliseconds
pub const TRAY_MESSAGE_MS: u32 = 1000;

// ============================================================================
// PROJECT
// ============================================================================

pub const APP_DISPLAY_NAME: &str = "DesktopTimer";
pub const PROJECT_URL: &str = "https://github.com/RE-TikaRa/DesktopTimer";
