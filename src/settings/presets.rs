//! Countdown presets
//!
//! A preset is a named countdown duration the user can start with one
//! action. The list stored in settings is never empty: a missing, empty or
//! malformed list is replaced by the built-in presets.

use super::normalize::coerce_int;
use super::CountdownDuration;
use crate::constants::{COUNTDOWN_HOURS_MAX, COUNTDOWN_MINUTES_MAX, COUNTDOWN_SECONDS_MAX};
use crate::i18n::{Catalog, Language};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// (id, hours, minutes, seconds, name_key)
const BUILTIN_PRESETS: &[(&str, u32, u32, u32, Option<&str>)] = &[
    ("builtin_pomodoro", 0, 25, 0, Some("pomodoro")),
    ("builtin_short_break", 0, 5, 0, Some("short_break")),
    ("builtin_long_break", 0, 15, 0, Some("long_break")),
    ("builtin_10m", 0, 10, 0, None),
    ("builtin_20m", 0, 20, 0, None),
    ("builtin_30m", 0, 30, 0, None),
    ("builtin_45m", 0, 45, 0, None),
    ("builtin_1h", 1, 0, 0, None),
    ("builtin_1h30", 1, 30, 0, None),
    ("builtin_2h", 2, 0, 0, None),
    ("builtin_3h", 3, 0, 0, None),
];

/// A saved countdown duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownPreset {
    pub id: String,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    /// Label per language code, e.g. `{"zh_CN": "午休"}`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Catalog key used as the label when no explicit label exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_key: Option<String>,
}

/// Rejected input from the custom countdown / preset editor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresetInputError {
    #[error("'{value}' is not a valid number of {field}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Countdown duration must be longer than zero")]
    ZeroDuration,

    #[error("Preset name cannot be empty")]
    EmptyLabel,
}

impl PresetInputError {
    /// Catalog key of the message shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            PresetInputError::InvalidNumber { .. } | PresetInputError::ZeroDuration => {
                "custom_countdown_invalid"
            }
            PresetInputError::EmptyLabel => "preset_label_required",
        }
    }
}

pub fn builtin_presets() -> Vec<CountdownPreset> {
    BUILTIN_PRESETS
        .iter()
        .map(|&(id, hours, minutes, seconds, name_key)| CountdownPreset {
            id: id.to_string(),
            hours,
            minutes,
            seconds,
            labels: BTreeMap::new(),
            name_key: name_key.map(str::to_string),
        })
        .collect()
}

impl CountdownPreset {
    pub fn duration(&self) -> CountdownDuration {
        CountdownDuration {
            hours: self.hours,
            minutes: self.minutes,
            seconds: self.seconds,
        }
    }

    /// Explicit label for `lang`, falling back to the same base language,
    /// then to any label at all
    pub fn label_for(&self, lang: Language) -> Option<&str> {
        let code = lang.code();
        if let Some(label) = self.labels.get(code) {
            return Some(label.as_str());
        }
        let base = code.split('_').next().unwrap_or(code);
        self.labels
            .iter()
            .find(|(key, _)| key.split('_').next() == Some(base))
            .or_else(|| self.labels.iter().next())
            .map(|(_, label)| label.as_str())
    }

    /// Text shown in menus: explicit label, translated name, or the duration
    pub fn display_label(&self, catalog: &Catalog, lang: Language) -> String {
        if let Some(label) = self.label_for(lang) {
            return label.to_string();
        }
        if let Some(name_key) = self.name_key.as_deref() {
            let translated = catalog.translate(lang, name_key);
            if translated != name_key {
                return translated.to_string();
            }
        }
        duration_text(self.duration(), catalog, lang)
    }
}

/// Human duration such as "1小时30分钟" or "1 hours 30 minutes"
pub fn duration_text(duration: CountdownDuration, catalog: &Catalog, lang: Language) -> String {
    let parts: Vec<String> = [
        (duration.hours, "hours"),
        (duration.minutes, "minutes"),
        (duration.seconds, "seconds"),
    ]
    .into_iter()
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit_key)| unit_text(value, catalog.translate(lang, unit_key), lang))
    .collect();

    if parts.is_empty() {
        return unit_text(0, catalog.translate(lang, "seconds"), lang);
    }
    let separator = if lang.is_chinese() { "" } else { " " };
    parts.join(separator)
}

fn unit_text(value: u32, unit: &str, lang: Language) -> String {
    if lang.is_chinese() {
        format!("{}{}", value, unit)
    } else {
        format!("{} {}", value, unit)
    }
}

/// Random lowercase hex token of `byte_len * 2` characters
pub fn random_token(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    if let Err(e) = getrandom::getrandom(&mut bytes) {
        log::warn!("System RNG unavailable ({}), using clock-derived preset id", e);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (nanos >> ((i % 16) * 8)) as u8;
        }
    }
    hex::encode(bytes)
}

pub fn generate_preset_id() -> String {
    format!("preset_{}", random_token(4))
}

/// Coerce a loosely typed JSON number into [0, max]; anything unusable is 0
fn coerce_clamped(value: Option<&Value>, max: i64) -> (u32, bool) {
    let Some(value) = value else {
        return (0, false);
    };
    if let Some(n) = value.as_i64().filter(|n| (0..=max).contains(n)) {
        return (n as u32, false);
    }
    let parsed = coerce_int(value).unwrap_or(0);
    (parsed.clamp(0, max) as u32, true)
}

fn clean_labels(raw: Option<&Value>) -> BTreeMap<String, String> {
    raw.and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(code, text)| {
                    let text = text.as_str()?.trim();
                    (!text.is_empty()).then(|| (code.clone(), text.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the raw `countdown_presets` value of a settings file
///
/// Entries that are not objects are dropped. Ids are left as found; call
/// [`normalize_presets`] afterwards to repair them.
pub fn presets_from_value(raw: Option<&Value>, lang: Language) -> (Vec<CountdownPreset>, bool) {
    let entries = match raw.and_then(Value::as_array) {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            log::info!("No usable countdown presets, using built-in list");
            return (builtin_presets(), true);
        }
    };

    let mut changed = false;
    let mut presets = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            log::warn!("Dropping malformed countdown preset: {}", entry);
            changed = true;
            continue;
        };

        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let (hours, h_fixed) = coerce_clamped(obj.get("hours"), COUNTDOWN_HOURS_MAX);
        let (minutes, m_fixed) = coerce_clamped(obj.get("minutes"), COUNTDOWN_MINUTES_MAX);
        let (seconds, s_fixed) = coerce_clamped(obj.get("seconds"), COUNTDOWN_SECONDS_MAX);
        changed |= h_fixed || m_fixed || s_fixed;

        let mut labels = clean_labels(obj.get("labels"));
        if let Some(single) = obj.get("label").and_then(Value::as_str) {
            let single = single.trim();
            if !single.is_empty() {
                labels
                    .entry(lang.code().to_string())
                    .or_insert_with(|| single.to_string());
            }
            changed = true;
        }

        let name_key = obj
            .get("name_key")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        presets.push(CountdownPreset {
            id,
            hours,
            minutes,
            seconds,
            labels,
            name_key,
        });
    }

    changed |= normalize_presets(&mut presets);
    (presets, changed)
}

/// Repair ids and ranges in place; returns whether anything changed
///
/// Blank ids get a fresh `preset_<hex>` id, duplicates get a random suffix,
/// and an empty list is replaced by the built-in presets.
pub fn normalize_presets(presets: &mut Vec<CountdownPreset>) -> bool {
    let mut changed = false;
    let mut seen: HashSet<String> = HashSet::new();

    for preset in presets.iter_mut() {
        let trimmed = preset.id.trim();
        if trimmed.is_empty() {
            preset.id = generate_preset_id();
            changed = true;
        } else if trimmed.len() != preset.id.len() {
            preset.id = trimmed.to_string();
            changed = true;
        }
        if seen.contains(&preset.id) {
            let base = preset.id.clone();
            while seen.contains(&preset.id) {
                preset.id = format!("{}_{}", base, random_token(2));
            }
            log::info!("Duplicate preset id '{}' renamed to '{}'", base, preset.id);
            changed = true;
        }
        seen.insert(preset.id.clone());

        let clamped = CountdownDuration::clamped(
            i64::from(preset.hours),
            i64::from(preset.minutes),
            i64::from(preset.seconds),
        );
        if clamped != preset.duration() {
            preset.hours = clamped.hours;
            preset.minutes = clamped.minutes;
            preset.seconds = clamped.seconds;
            changed = true;
        }

        let before = preset.labels.len();
        preset.labels.retain(|_, label| !label.trim().is_empty());
        changed |= before != preset.labels.len();
    }

    if presets.is_empty() {
        *presets = builtin_presets();
        changed = true;
    }
    changed
}

fn parse_field(text: &str, field: &'static str, max: i64) -> Result<u32, PresetInputError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    let value = text
        .parse::<i64>()
        .map_err(|_| PresetInputError::InvalidNumber {
            field,
            value: text.to_string(),
        })?;
    Ok(value.clamp(0, max) as u32)
}

/// Validate the hours/minutes/seconds typed into the custom countdown dialog
pub fn parse_duration_input(
    hours: &str,
    minutes: &str,
    seconds: &str,
) -> Result<CountdownDuration, PresetInputError> {
    let duration = CountdownDuration {
        hours: parse_field(hours, "hours", COUNTDOWN_HOURS_MAX)?,
        minutes: parse_field(minutes, "minutes", COUNTDOWN_MINUTES_MAX)?,
        seconds: parse_field(seconds, "seconds", COUNTDOWN_SECONDS_MAX)?,
    };
    if duration.is_zero() {
        return Err(PresetInputError::ZeroDuration);
    }
    Ok(duration)
}

/// Validate a new preset from the preset editor and give it a fresh id
pub fn validate_preset_input(
    label: &str,
    hours: &str,
    minutes: &str,
    seconds: &str,
    lang: Language,
) -> Result<CountdownPreset, PresetInputError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(PresetInputError::EmptyLabel);
    }
    let duration = parse_duration_input(hours, minutes, seconds)?;
    Ok(CountdownPreset {
        id: generate_preset_id(),
        hours: duration.hours,
        minutes: duration.minutes,
        seconds: duration.seconds,
        labels: BTreeMap::from([(lang.code().to_string(), label.to_string())]),
        name_key: None,
    })
}
