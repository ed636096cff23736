//! Typed settings document
//!
//! `Settings` mirrors the flat JSON object stored in `timer_settings.json`.
//! Loading goes through a single tolerant normalization pass (see
//! `normalize`), so consuming code can rely on every invariant holding.

pub mod legacy;
pub mod normalize;
pub mod presets;

use crate::constants::{
    BG_OPACITY_DEFAULT, COUNTDOWN_HOURS_MAX, COUNTDOWN_MINUTES_MAX, COUNTDOWN_SECONDS_MAX,
    FONT_SIZE_DEFAULT, SOUND_VOLUME_DEFAULT,
};
use crate::i18n::{Catalog, Language};
use crate::timer::format::ClockFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub use legacy::{derive_action_key, derive_mode_key};
pub use presets::{CountdownPreset, PresetInputError};

pub const DEFAULT_FONT_FAMILY: &str = "Consolas";
pub const DEFAULT_TEXT_COLOR: &str = "#E0E0E0";
pub const DEFAULT_BG_COLOR: &str = "#1E1E1E";
pub const DEFAULT_THEME_COLOR: &str = "#0078D4";
pub const DEFAULT_SOUND_FILE: &str = "sounds/Alarm01.wav";

/// Built-in key chords, keyed by shortcut action name
pub const DEFAULT_SHORTCUTS: &[(&str, &str)] = &[
    ("pause_resume", "Ctrl+Space"),
    ("reset", "Ctrl+R"),
    ("show_hide", "Ctrl+H"),
    ("open_settings", "Ctrl+,"),
    ("lock_unlock", "Ctrl+L"),
    ("toggle_fullscreen", "F11"),
];

pub fn default_shortcuts() -> BTreeMap<String, String> {
    DEFAULT_SHORTCUTS
        .iter()
        .map(|(action, chord)| (action.to_string(), chord.to_string()))
        .collect()
}

/// Language-independent timer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModeKey {
    CountUp,
    #[default]
    Countdown,
    Clock,
}

impl ModeKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ModeKey::CountUp => "countup",
            ModeKey::Countdown => "countdown",
            ModeKey::Clock => "clock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "countup" => Some(ModeKey::CountUp),
            "countdown" => Some(ModeKey::Countdown),
            "clock" => Some(ModeKey::Clock),
            _ => None,
        }
    }

    /// Catalog key of the human-readable mode name
    pub fn label_key(self) -> &'static str {
        match self {
            ModeKey::CountUp => "count_up_mode",
            ModeKey::Countdown => "countdown_mode",
            ModeKey::Clock => "clock_mode",
        }
    }
}

impl fmt::Display for ModeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens when a countdown reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionKey {
    #[default]
    Beep,
    Flash,
    BeepFlash,
}

impl ActionKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKey::Beep => "beep",
            ActionKey::Flash => "flash",
            ActionKey::BeepFlash => "beep_flash",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beep" => Some(ActionKey::Beep),
            "flash" => Some(ActionKey::Flash),
            "beep_flash" => Some(ActionKey::BeepFlash),
            _ => None,
        }
    }

    pub fn beeps(self) -> bool {
        matches!(self, ActionKey::Beep | ActionKey::BeepFlash)
    }

    pub fn flashes(self) -> bool {
        matches!(self, ActionKey::Flash | ActionKey::BeepFlash)
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(ThemeMode::Auto),
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }
}

/// Language of the AM/PM indicator in 12-hour clock mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AmPmStyle {
    En,
    #[default]
    Zh,
}

impl AmPmStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en" => Some(AmPmStyle::En),
            "zh" => Some(AmPmStyle::Zh),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AmPmPosition {
    #[default]
    Before,
    After,
}

impl AmPmPosition {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "before" => Some(AmPmPosition::Before),
            "after" => Some(AmPmPosition::After),
            _ => None,
        }
    }
}

/// Which mode the timer starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StartupBehavior {
    /// Resume the last used mode
    #[default]
    Restore,
    /// Always start in `startup_fixed_mode_key`
    Fixed,
}

impl StartupBehavior {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "restore" => Some(StartupBehavior::Restore),
            "fixed" => Some(StartupBehavior::Fixed),
            _ => None,
        }
    }
}

/// A clamped countdown length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownDuration {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl CountdownDuration {
    /// Build a duration, clamping each field into its valid range
    pub fn clamped(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            hours: hours.clamp(0, COUNTDOWN_HOURS_MAX) as u32,
            minutes: minutes.clamp(0, COUNTDOWN_MINUTES_MAX) as u32,
            seconds: seconds.clamp(0, COUNTDOWN_SECONDS_MAX) as u32,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.total_seconds() == 0
    }
}

/// The persisted settings document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub font_family: String,
    pub font_size: i64,
    pub text_color: String,
    pub bg_color: String,
    pub bg_opacity: i64,
    pub night_mode: bool,
    /// Localized mode name kept for older releases; logic uses `timer_mode_key`
    pub timer_mode: String,
    pub timer_mode_key: ModeKey,
    pub countdown_hours: i64,
    pub countdown_minutes: i64,
    pub countdown_seconds: i64,
    /// Free-text action kept for older releases; logic uses `countdown_action_key`
    pub countdown_action: String,
    pub countdown_action_key: ActionKey,
    pub sound_file: String,
    pub sound_volume: i64,
    pub enable_sound: bool,
    pub enable_popup: bool,
    pub enable_windows_toast: bool,
    pub auto_start_timer: bool,
    pub theme_mode: ThemeMode,
    pub theme_color: String,
    pub language: Language,
    pub clock_format_24h: bool,
    pub clock_show_seconds: bool,
    pub clock_show_date: bool,
    pub clock_show_am_pm: bool,
    pub clock_am_pm_style: AmPmStyle,
    pub clock_am_pm_position: AmPmPosition,
    pub startup_mode_behavior: StartupBehavior,
    pub startup_fixed_mode_key: ModeKey,
    pub shortcuts: BTreeMap<String, String>,
    pub countdown_presets: Vec<CountdownPreset>,
    /// Keys owned by the UI layer (window geometry, corner radius, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: FONT_SIZE_DEFAULT,
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            bg_opacity: BG_OPACITY_DEFAULT,
            night_mode: false,
            timer_mode: "倒计时".to_string(),
            timer_mode_key: ModeKey::Countdown,
            countdown_hours: 0,
            countdown_minutes: 25,
            countdown_seconds: 0,
            countdown_action: "beep".to_string(),
            countdown_action_key: ActionKey::Beep,
            sound_file: DEFAULT_SOUND_FILE.to_string(),
            sound_volume: SOUND_VOLUME_DEFAULT,
            enable_sound: true,
            enable_popup: true,
            enable_windows_toast: true,
            auto_start_timer: false,
            theme_mode: ThemeMode::Auto,
            theme_color: DEFAULT_THEME_COLOR.to_string(),
            language: Language::ZhCn,
            clock_format_24h: true,
            clock_show_seconds: true,
            clock_show_date: false,
            clock_show_am_pm: true,
            clock_am_pm_style: AmPmStyle::Zh,
            clock_am_pm_position: AmPmPosition::Before,
            startup_mode_behavior: StartupBehavior::Restore,
            startup_fixed_mode_key: ModeKey::Countdown,
            shortcuts: default_shortcuts(),
            countdown_presets: presets::builtin_presets(),
            extra: Map::new(),
        }
    }
}

impl Settings {
    pub fn countdown_duration(&self) -> CountdownDuration {
        CountdownDuration::clamped(
            self.countdown_hours,
            self.countdown_minutes,
            self.countdown_seconds,
        )
    }

    pub fn set_countdown_duration(&mut self, duration: CountdownDuration) {
        self.countdown_hours = i64::from(duration.hours);
        self.countdown_minutes = i64::from(duration.minutes);
        self.countdown_seconds = i64::from(duration.seconds);
    }

    /// Set the mode key and keep the legacy localized name in step
    pub fn set_mode(&mut self, mode: ModeKey, catalog: &Catalog) {
        self.timer_mode_key = mode;
        self.timer_mode = catalog.translate(self.language, mode.label_key()).to_string();
    }

    /// Mode the timer should open in, honouring `startup_mode_behavior`
    pub fn startup_mode(&self) -> ModeKey {
        match self.startup_mode_behavior {
            StartupBehavior::Restore => self.timer_mode_key,
            StartupBehavior::Fixed => self.startup_fixed_mode_key,
        }
    }

    pub fn clock_format(&self) -> ClockFormat {
        ClockFormat {
            use_24h: self.clock_format_24h,
            show_seconds: self.clock_show_seconds,
            show_date: self.clock_show_date,
            show_am_pm: self.clock_show_am_pm,
            am_pm_style: self.clock_am_pm_style,
            am_pm_position: self.clock_am_pm_position,
        }
    }

    pub fn preset(&self, id: &str) -> Option<&CountdownPreset> {
        self.countdown_presets.iter().find(|preset| preset.id == id)
    }
}
