//! Localized phrase lookup
//!
//! The catalog is built once at startup and shared by reference. Built-in
//! phrases cover both supported languages; `lang/<code>.json` files next to
//! the executable may override individual entries.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Supported UI languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "zh_CN")]
    ZhCn,
    #[serde(rename = "en_US")]
    EnUs,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::ZhCn, Language::EnUs];

    pub fn code(self) -> &'static str {
        match self {
            Language::ZhCn => "zh_CN",
            Language::EnUs => "en_US",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }

    /// Chinese text is written without spaces between number and unit
    pub fn is_chinese(self) -> bool {
        matches!(self, Language::ZhCn)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

const ZH_CN: &[(&str, &str)] = &[
    ("app_name", "桌面计时器"),
    ("count_up_mode", "正计时"),
    ("countdown_mode", "倒计时"),
    ("clock_mode", "时钟"),
    ("action_beep", "提示音"),
    ("action_flash", "闪烁"),
    ("action_beep_flash", "提示音+闪烁"),
    ("hours", "小时"),
    ("minutes", "分钟"),
    ("seconds", "秒"),
    ("pomodoro", "番茄钟"),
    ("short_break", "短休息"),
    ("long_break", "长休息"),
    ("quick_presets", "快速倒计时"),
    ("custom_countdown_title", "自定义倒计时"),
    ("custom_countdown_invalid", "请输入有效的时长（不能全部为 0）"),
    ("preset_label_required", "请输入预设名称"),
    ("countdown_finished", "倒计时结束"),
    ("countdown_finished_msg", "时间到！"),
    ("countdown_set", "倒计时已设置"),
    ("pause", "暂停"),
    ("continue", "继续"),
    ("reset", "重置"),
    ("timer_paused", "计时已暂停"),
    ("timer_continued", "计时已继续"),
    ("timer_reset", "计时已重置"),
    ("lock_window", "锁定窗口"),
    ("unlock_window", "解锁窗口"),
    ("window_locked", "窗口已锁定（鼠标穿透）"),
    ("window_unlocked", "窗口已解锁"),
    ("enter_fullscreen", "进入全屏"),
    ("exit_fullscreen", "退出全屏"),
    ("show_hide", "显示/隐藏"),
    ("settings", "设置"),
    ("quit", "退出"),
    ("minimized_to_tray", "已最小化到托盘"),
];

const EN_US: &[(&str, &str)] = &[
    ("app_name", "Desktop Timer"),
    ("count_up_mode", "Count Up"),
    ("countdown_mode", "Countdown"),
    ("clock_mode", "Clock"),
    ("action_beep", "Sound"),
    ("action_flash", "Flash"),
    ("action_beep_flash", "Sound + Flash"),
    ("hours", "hours"),
    ("minutes", "minutes"),
    ("seconds", "seconds"),
    ("pomodoro", "Pomodoro"),
    ("short_break", "Short Break"),
    ("long_break", "Long Break"),
    ("quick_presets", "Quick Countdown"),
    ("custom_countdown_title", "Custom Countdown"),
    ("custom_countdown_invalid", "Please enter a valid duration (not all zero)"),
    ("preset_label_required", "Please enter a preset name"),
    ("countdown_finished", "Countdown Finished"),
    ("countdown_finished_msg", "Time's up!"),
    ("countdown_set", "Countdown set"),
    ("pause", "Pause"),
    ("continue", "Resume"),
    ("reset", "Reset"),
    ("timer_paused", "Timer paused"),
    ("timer_continued", "Timer resumed"),
    ("timer_reset", "Timer reset"),
    ("lock_window", "Lock Window"),
    ("unlock_window", "Unlock Window"),
    ("window_locked", "Window locked (click-through)"),
    ("window_unlocked", "Window unlocked"),
    ("enter_fullscreen", "Enter Fullscreen"),
    ("exit_fullscreen", "Exit Fullscreen"),
    ("show_hide", "Show/Hide"),
    ("settings", "Settings"),
    ("quit", "Quit"),
    ("minimized_to_tray", "Minimized to tray"),
];

/// Immutable phrase table for every supported language
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: HashMap<Language, HashMap<String, String>>,
}

impl Catalog {
    /// Catalog with only the compiled-in phrases
    pub fn builtin() -> Self {
        let mut tables = HashMap::new();
        for (lang, entries) in [(Language::ZhCn, ZH_CN), (Language::EnUs, EN_US)] {
            let table = entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            tables.insert(lang, table);
        }
        Self { tables }
    }

    /// Built-in phrases overlaid with `<dir>/<code>.json` where present
    ///
    /// A missing or unreadable file leaves that language on built-ins.
    pub fn load(lang_dir: &Path) -> Self {
        let mut catalog = Self::builtin();
        for lang in Language::ALL {
            let path = lang_dir.join(format!("{}.json", lang.code()));
            if !path.exists() {
                continue;
            }
            match Self::read_overrides(&path) {
                Ok(overrides) => {
                    log::debug!(
                        "Loaded {} phrase overrides from {}",
                        overrides.len(),
                        path.display()
                    );
                    if let Some(table) = catalog.tables.get_mut(&lang) {
                        table.extend(overrides);
                    }
                }
                Err(e) => log::warn!("Ignoring language file {}: {:#}", path.display(), e),
            }
        }
        catalog
    }

    fn read_overrides(path: &Path) -> Result<HashMap<String, String>> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read language file: {}", path.display()))?;
        let overrides: HashMap<String, String> =
            serde_json::from_str(&contents).context("Failed to parse language file")?;
        Ok(overrides)
    }

    /// Look up `key`; unknown keys translate to themselves
    pub fn translate<'a>(&'a self, lang: Language, key: &'a str) -> &'a str {
        self.tables
            .get(&lang)
            .and_then(|table| table.get(key))
            .map(String::as_str)
            .unwrap_or(key)
    }

    /// Every non-empty translation of `key`, across all languages
    pub fn phrases<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        Language::ALL
            .into_iter()
            .filter_map(move |lang| self.tables.get(&lang).and_then(|t| t.get(key)))
            .map(String::as_str)
            .filter(|phrase| !phrase.trim().is_empty())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
