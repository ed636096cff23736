//! Tolerant loading and repair of the settings document
//!
//! `Settings::from_value` accepts whatever JSON is on disk (older releases,
//! hand edits, partial writes) and produces a typed document together with
//! a flag saying whether anything had to be backfilled or corrected.
//! `Settings::validate_and_fix` re-applies the range and format invariants
//! to an already typed document.

use super::presets::{normalize_presets, presets_from_value};
use super::{
    default_shortcuts, derive_action_key, derive_mode_key, ActionKey, AmPmPosition, AmPmStyle,
    ModeKey, Settings, StartupBehavior, ThemeMode, DEFAULT_BG_COLOR, DEFAULT_FONT_FAMILY,
    DEFAULT_SOUND_FILE, DEFAULT_TEXT_COLOR, DEFAULT_THEME_COLOR,
};
use crate::constants::{
    BG_OPACITY_DEFAULT, BG_OPACITY_MAX, BG_OPACITY_MIN, COUNTDOWN_HOURS_MAX,
    COUNTDOWN_MINUTES_MAX, COUNTDOWN_SECONDS_MAX, FONT_SIZE_DEFAULT, FONT_SIZE_MAX,
    FONT_SIZE_MIN, SOUNDS_DIR_NAME, SOUND_VOLUME_DEFAULT, SOUND_VOLUME_MAX, SOUND_VOLUME_MIN,
};
use crate::i18n::{Catalog, Language};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::path::{Component, Path};

/// Keys owned by `Settings`; everything else lands in `Settings::extra`
const KNOWN_KEYS: &[&str] = &[
    "font_family",
    "font_size",
    "text_color",
    "bg_color",
    "bg_opacity",
    "night_mode",
    "timer_mode",
    "timer_mode_key",
    "countdown_hours",
    "countdown_minutes",
    "countdown_seconds",
    "countdown_action",
    "countdown_action_key",
    "sound_file",
    "sound_volume",
    "enable_sound",
    "enable_popup",
    "enable_windows_toast",
    "auto_start_timer",
    "theme_mode",
    "theme_color",
    "language",
    "clock_format_24h",
    "clock_show_seconds",
    "clock_show_date",
    "clock_show_am_pm",
    "clock_am_pm_style",
    "clock_am_pm_position",
    "startup_mode_behavior",
    "startup_fixed_mode_key",
    "shortcuts",
    "countdown_presets",
];

/// Integer from a JSON number, a float (truncated) or a numeric string
///
/// Only preset entries are this lenient; top-level fields must be integers.
pub(crate) fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `#RRGGBB`
pub fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Typed field extraction that records every backfill and correction
struct FieldReader<'a> {
    raw: &'a Map<String, Value>,
    changed: bool,
}

impl<'a> FieldReader<'a> {
    fn new(raw: &'a Map<String, Value>) -> Self {
        Self {
            raw,
            changed: false,
        }
    }

    fn get(&mut self, key: &str) -> Option<&'a Value> {
        let value = self.raw.get(key);
        if value.is_none() {
            log::debug!("Backfilling missing setting '{}'", key);
            self.changed = true;
        }
        value
    }

    fn reject(&mut self, key: &str, value: &Value) {
        log::warn!("Setting '{}' has invalid value {}, using default", key, value);
        self.changed = true;
    }

    fn optional_string(&mut self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.reject(key, other);
                None
            }
        }
    }

    fn string(&mut self, key: &str, default: &str) -> String {
        self.optional_string(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn boolean(&mut self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                self.reject(key, other);
                default
            }
            None => default,
        }
    }

    /// `default` backfills a missing key, `invalid` replaces anything that
    /// is not a JSON integer (numeric strings and floats included)
    fn int(&mut self, key: &str, default: i64, invalid: i64) -> i64 {
        let Some(value) = self.get(key) else {
            return default;
        };
        match value.as_i64() {
            Some(n) => n,
            None => {
                self.reject(key, value);
                invalid
            }
        }
    }

    /// Enum stored as a string keyword; `None` when absent
    fn keyword<T>(
        &mut self,
        key: &str,
        parse: impl Fn(&str) -> Option<T>,
        invalid: T,
    ) -> Option<T> {
        let value = self.get(key)?;
        match value.as_str().and_then(parse) {
            Some(parsed) => Some(parsed),
            None => {
                self.reject(key, value);
                Some(invalid)
            }
        }
    }

    fn keyword_or<T: Copy>(
        &mut self,
        key: &str,
        parse: impl Fn(&str) -> Option<T>,
        default: T,
    ) -> T {
        self.keyword(key, parse, default).unwrap_or(default)
    }
}

/// Replace `value` with `replacement` when `ok` fails, logging the repair
fn repair<T: Debug>(field: &str, value: &mut T, ok: bool, replacement: T) -> bool {
    if ok {
        return false;
    }
    log::warn!(
        "Setting '{}' value {:?} is out of range, reset to {:?}",
        field,
        value,
        replacement
    );
    *value = replacement;
    true
}

fn clamp_field(field: &str, value: &mut i64, max: i64) -> bool {
    let clamped = (*value).clamp(0, max);
    if clamped == *value {
        return false;
    }
    log::warn!("Setting '{}' value {} clamped to {}", field, value, clamped);
    *value = clamped;
    true
}

impl Settings {
    /// Build a settings document from raw JSON, returning whether it was upgraded
    ///
    /// Never fails: a non-object root yields the defaults.
    pub fn from_value(raw: &Value, catalog: &Catalog) -> (Settings, bool) {
        let Some(obj) = raw.as_object() else {
            log::warn!("Settings root is not a JSON object, using defaults");
            return (Settings::default(), true);
        };
        let defaults = Settings::default();
        let mut reader = FieldReader::new(obj);

        let language = reader.keyword_or("language", Language::from_code, defaults.language);

        let timer_mode_text = reader.optional_string("timer_mode");
        let stored_mode_key = reader.keyword("timer_mode_key", ModeKey::parse, ModeKey::Countdown);
        let timer_mode_key = match stored_mode_key {
            Some(key) => key,
            None => timer_mode_text
                .as_deref()
                .map(|text| derive_mode_key(text, catalog))
                .unwrap_or_default(),
        };
        let timer_mode = timer_mode_text.unwrap_or_else(|| {
            catalog
                .translate(language, timer_mode_key.label_key())
                .to_string()
        });

        let countdown_action_text = reader.optional_string("countdown_action");
        let stored_action_key = obj
            .get("countdown_action_key")
            .and_then(Value::as_str)
            .and_then(ActionKey::parse);
        let countdown_action_key = match stored_action_key {
            Some(key) => key,
            None => {
                log::info!("Deriving countdown action key from legacy text");
                reader.changed = true;
                derive_action_key(countdown_action_text.as_deref().unwrap_or_default(), catalog)
            }
        };
        // The legacy text is backfilled with its own default, not from the key
        let countdown_action =
            countdown_action_text.unwrap_or_else(|| defaults.countdown_action.clone());

        let shortcuts = match obj.get("shortcuts") {
            Some(Value::Object(map)) => {
                let mut merged = default_shortcuts();
                for (action, chord) in map {
                    match chord.as_str() {
                        Some(chord) => {
                            merged.insert(action.clone(), chord.to_string());
                        }
                        None => reader.reject("shortcuts", chord),
                    }
                }
                if merged.len() != map.len() {
                    reader.changed = true;
                }
                merged
            }
            Some(other) => {
                reader.reject("shortcuts", other);
                default_shortcuts()
            }
            None => {
                reader.changed = true;
                default_shortcuts()
            }
        };

        let (countdown_presets, presets_changed) =
            presets_from_value(obj.get("countdown_presets"), language);
        reader.changed |= presets_changed;

        let extra: Map<String, Value> = obj
            .iter()
            .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut settings = Settings {
            font_family: reader.string("font_family", DEFAULT_FONT_FAMILY),
            font_size: reader.int("font_size", FONT_SIZE_DEFAULT, FONT_SIZE_DEFAULT),
            text_color: reader.string("text_color", DEFAULT_TEXT_COLOR),
            bg_color: reader.string("bg_color", DEFAULT_BG_COLOR),
            bg_opacity: reader.int("bg_opacity", BG_OPACITY_DEFAULT, BG_OPACITY_DEFAULT),
            night_mode: reader.boolean("night_mode", defaults.night_mode),
            timer_mode,
            timer_mode_key,
            countdown_hours: reader.int("countdown_hours", defaults.countdown_hours, 0),
            countdown_minutes: reader.int("countdown_minutes", defaults.countdown_minutes, 0),
            countdown_seconds: reader.int("countdown_seconds", defaults.countdown_seconds, 0),
            countdown_action,
            countdown_action_key,
            sound_file: reader.string("sound_file", DEFAULT_SOUND_FILE),
            sound_volume: reader.int("sound_volume", SOUND_VOLUME_DEFAULT, SOUND_VOLUME_DEFAULT),
            enable_sound: reader.boolean("enable_sound", defaults.enable_sound),
            enable_popup: reader.boolean("enable_popup", defaults.enable_popup),
            enable_windows_toast: reader
                .boolean("enable_windows_toast", defaults.enable_windows_toast),
            auto_start_timer: reader.boolean("auto_start_timer", defaults.auto_start_timer),
            theme_mode: reader.keyword_or("theme_mode", ThemeMode::parse, defaults.theme_mode),
            theme_color: reader.string("theme_color", DEFAULT_THEME_COLOR),
            language,
            clock_format_24h: reader.boolean("clock_format_24h", defaults.clock_format_24h),
            clock_show_seconds: reader.boolean("clock_show_seconds", defaults.clock_show_seconds),
            clock_show_date: reader.boolean("clock_show_date", defaults.clock_show_date),
            clock_show_am_pm: reader.boolean("clock_show_am_pm", defaults.clock_show_am_pm),
            clock_am_pm_style: reader.keyword_or(
                "clock_am_pm_style",
                AmPmStyle::parse,
                defaults.clock_am_pm_style,
            ),
            clock_am_pm_position: reader.keyword_or(
                "clock_am_pm_position",
                AmPmPosition::parse,
                defaults.clock_am_pm_position,
            ),
            startup_mode_behavior: reader.keyword_or(
                "startup_mode_behavior",
                StartupBehavior::parse,
                defaults.startup_mode_behavior,
            ),
            startup_fixed_mode_key: reader.keyword_or(
                "startup_fixed_mode_key",
                ModeKey::parse,
                defaults.startup_fixed_mode_key,
            ),
            shortcuts,
            countdown_presets,
            extra,
        };

        let changed = settings.validate_and_fix() | reader.changed;
        (settings, changed)
    }

    /// Re-apply every range and format invariant; returns whether anything changed
    pub fn validate_and_fix(&mut self) -> bool {
        let mut changed = false;

        let font_ok = !self.font_family.trim().is_empty();
        changed |= repair(
            "font_family",
            &mut self.font_family,
            font_ok,
            DEFAULT_FONT_FAMILY.to_string(),
        );
        let size_ok = (FONT_SIZE_MIN..=FONT_SIZE_MAX).contains(&self.font_size);
        changed |= repair("font_size", &mut self.font_size, size_ok, FONT_SIZE_DEFAULT);
        let opacity_ok = (BG_OPACITY_MIN..=BG_OPACITY_MAX).contains(&self.bg_opacity);
        changed |= repair("bg_opacity", &mut self.bg_opacity, opacity_ok, BG_OPACITY_DEFAULT);
        let volume_ok = (SOUND_VOLUME_MIN..=SOUND_VOLUME_MAX).contains(&self.sound_volume);
        changed |= repair(
            "sound_volume",
            &mut self.sound_volume,
            volume_ok,
            SOUND_VOLUME_DEFAULT,
        );

        for (field, color, default) in [
            ("text_color", &mut self.text_color, DEFAULT_TEXT_COLOR),
            ("bg_color", &mut self.bg_color, DEFAULT_BG_COLOR),
            ("theme_color", &mut self.theme_color, DEFAULT_THEME_COLOR),
        ] {
            let ok = is_valid_color(color);
            changed |= repair(field, color, ok, default.to_string());
        }

        let sound_ok = !self.sound_file.trim().is_empty();
        changed |= repair(
            "sound_file",
            &mut self.sound_file,
            sound_ok,
            DEFAULT_SOUND_FILE.to_string(),
        );

        changed |= clamp_field("countdown_hours", &mut self.countdown_hours, COUNTDOWN_HOURS_MAX);
        changed |= clamp_field(
            "countdown_minutes",
            &mut self.countdown_minutes,
            COUNTDOWN_MINUTES_MAX,
        );
        changed |= clamp_field(
            "countdown_seconds",
            &mut self.countdown_seconds,
            COUNTDOWN_SECONDS_MAX,
        );

        for (action, chord) in default_shortcuts() {
            let entry = self.shortcuts.entry(action).or_default();
            if entry.trim().is_empty() {
                *entry = chord;
                changed = true;
            }
        }

        changed |= normalize_presets(&mut self.countdown_presets);
        changed
    }

    /// Rewrite an absolute `sound_file` that points at an existing file under
    /// `<base_dir>/sounds` as a base-relative path; returns whether it changed
    pub fn relativize_sound_file(&mut self, base_dir: &Path) -> bool {
        let sound = Path::new(&self.sound_file);
        if !sound.is_absolute() || !sound.exists() {
            return false;
        }
        let Ok(relative) = sound.strip_prefix(base_dir) else {
            return false;
        };
        if !relative.starts_with(SOUNDS_DIR_NAME) {
            return false;
        }

        let parts: Vec<_> = relative
            .components()
            .filter_map(|part| match part {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect();
        let relative = parts.join("/");
        log::info!(
            "Converted absolute sound path {} to {}",
            self.sound_file,
            relative
        );
        self.sound_file = relative;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::presets::builtin_presets;
    use serde_json::json;

    fn load(raw: Value) -> (Settings, bool) {
        Settings::from_value(&raw, &Catalog::builtin())
    }

    #[test]
    fn test_defaults_round_trip_unchanged() {
        let raw = serde_json::to_value(Settings::default()).unwrap();
        let (settings, changed) = load(raw);
        assert!(!changed);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_empty_object_is_backfilled() {
        let (settings, changed) = load(json!({}));
        assert!(changed);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_non_object_root_uses_defaults() {
        let (settings, changed) = load(json!([1, 2, 3]));
        assert!(changed);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_out_of_range_opacity_resets_to_default() {
        for bad in [-5, 300] {
            let mut raw = serde_json::to_value(Settings::default()).unwrap();
            raw["bg_opacity"] = json!(bad);
            let (settings, changed) = load(raw);
            assert!(changed);
            assert_eq!(settings.bg_opacity, 200);
        }
    }

    #[test]
    fn test_font_size_and_volume_reset() {
        let mut raw = serde_json::to_value(Settings::default()).unwrap();
        raw["font_size"] = json!(8);
        raw["sound_volume"] = json!("loud");
        let (settings, changed) = load(raw);
        assert!(changed);
        assert_eq!(settings.font_size, 96);
        assert_eq!(settings.sound_volume, 80);
    }

    #[test]
    fn test_countdown_fields_clamp() {
        let mut raw = serde_json::to_value(Settings::default()).unwrap();
        raw["countdown_hours"] = json!(150);
        raw["countdown_minutes"] = json!(-1);
        raw["countdown_seconds"] = json!(30);
        let (settings, changed) = load(raw);
        assert!(changed);
        assert_eq!(settings.countdown_hours, 99);
        assert_eq!(settings.countdown_minutes, 0);
        assert_eq!(settings.countdown_seconds, 30);
    }

    #[test]
    fn test_non_integer_fields_are_rejected() {
        let mut raw = serde_json::to_value(Settings::default()).unwrap();
        raw["countdown_hours"] = json!("2");
        raw["countdown_minutes"] = json!(7.9);
        raw["font_size"] = json!("100");
        raw["bg_opacity"] = json!(150.5);
        raw["sound_volume"] = json!(true);
        let (settings, changed) = load(raw);
        assert!(changed);
        assert_eq!(settings.countdown_hours, 0);
        assert_eq!(settings.countdown_minutes, 0);
        assert_eq!(settings.font_size, FONT_SIZE_DEFAULT);
        assert_eq!(settings.bg_opacity, BG_OPACITY_DEFAULT);
        assert_eq!(settings.sound_volume, SOUND_VOLUME_DEFAULT);
    }

    #[test]
    fn test_missing_action_text_gets_default_not_key() {
        let (settings, changed) = load(json!({"countdown_action_key": "flash"}));
        assert!(changed);
        assert_eq!(settings.countdown_action_key, ActionKey::Flash);
        assert_eq!(settings.countdown_action, "beep");
    }

    #[test]
    fn test_invalid_colors_reset() {
        let mut raw = serde_json::to_value(Settings::default()).unwrap();
        raw["text_color"] = json!("red");
        raw["bg_color"] = json!("#12345G");
        let (settings, _) = load(raw);
        assert_eq!(settings.text_color, DEFAULT_TEXT_COLOR);
        assert_eq!(settings.bg_color, DEFAULT_BG_COLOR);
        assert!(is_valid_color("#abcDEF"));
        assert!(!is_valid_color("#abc"));
    }

    #[test]
    fn test_mode_key_derived_when_absent() {
        let (settings, changed) = load(json!({"timer_mode": "正计时"}));
        assert!(changed);
        assert_eq!(settings.timer_mode_key, ModeKey::CountUp);
        assert_eq!(settings.timer_mode, "正计时");
    }

    #[test]
    fn test_invalid_mode_key_falls_back_to_countdown() {
        let (settings, changed) =
            load(json!({"timer_mode": "Clock", "timer_mode_key": "stopwatch"}));
        assert!(changed);
        assert_eq!(settings.timer_mode_key, ModeKey::Countdown);
    }

    #[test]
    fn test_action_key_derived_from_legacy_text() {
        let (settings, _) = load(json!({"countdown_action": "提示音+闪烁"}));
        assert_eq!(settings.countdown_action_key, ActionKey::BeepFlash);

        let (settings, _) =
            load(json!({"countdown_action": "闪烁", "countdown_action_key": "bogus"}));
        assert_eq!(settings.countdown_action_key, ActionKey::Flash);
    }

    #[test]
    fn test_shortcuts_merge_keeps_existing_entries() {
        let (settings, changed) = load(json!({"shortcuts": {"reset": "Alt+R"}}));
        assert!(changed);
        assert_eq!(settings.shortcuts["reset"], "Alt+R");
        assert_eq!(settings.shortcuts["toggle_fullscreen"], "F11");
        assert_eq!(settings.shortcuts.len(), default_shortcuts().len());

        let (settings, _) = load(json!({"shortcuts": "Ctrl+X"}));
        assert_eq!(settings.shortcuts, default_shortcuts());
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let (settings, _) = load(json!({"window_x": 120, "corner_radius": 15}));
        assert_eq!(settings.extra["window_x"], json!(120));
        assert_eq!(settings.extra["corner_radius"], json!(15));
        assert!(!settings.extra.contains_key("font_size"));
    }

    #[test]
    fn test_invalid_enums_fall_back() {
        let (settings, _) = load(json!({
            "theme_mode": "neon",
            "language": "fr_FR",
            "startup_mode_behavior": "sometimes",
            "clock_am_pm_style": 3,
        }));
        assert_eq!(settings.theme_mode, ThemeMode::Auto);
        assert_eq!(settings.language, Language::ZhCn);
        assert_eq!(settings.startup_mode_behavior, StartupBehavior::Restore);
        assert_eq!(settings.clock_am_pm_style, AmPmStyle::Zh);
    }

    #[test]
    fn test_validate_and_fix_on_typed_document() {
        let mut settings = Settings::default();
        assert!(!settings.validate_and_fix());

        settings.font_family = "   ".to_string();
        settings.countdown_presets.clear();
        settings.shortcuts.remove("reset");
        assert!(settings.validate_and_fix());
        assert_eq!(settings.font_family, DEFAULT_FONT_FAMILY);
        assert_eq!(settings.countdown_presets, builtin_presets());
        assert_eq!(settings.shortcuts["reset"], "Ctrl+R");
    }

    #[test]
    fn test_relative_sound_file_is_left_alone() {
        let mut settings = Settings::default();
        assert!(!settings.relativize_sound_file(Path::new("/opt/timer")));
        assert_eq!(settings.sound_file, DEFAULT_SOUND_FILE);
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int(&json!(5)), Some(5));
        assert_eq!(coerce_int(&json!(5.8)), Some(5));
        assert_eq!(coerce_int(&json!(" 12 ")), Some(12));
        assert_eq!(coerce_int(&json!("abc")), None);
        assert_eq!(coerce_int(&json!(null)), None);
    }
}
