//! Keyboard shortcuts
//!
//! Chords come from the `shortcuts` setting as text such as `Ctrl+Space`
//! or `F11`. Parsing is always available; registering them as global
//! hot-keys needs the `tray` feature.

use std::fmt;

/// Action a shortcut triggers, keyed by its settings name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    PauseResume,
    Reset,
    ShowHide,
    OpenSettings,
    LockUnlock,
    ToggleFullscreen,
}

impl ShortcutAction {
    pub const ALL: [ShortcutAction; 6] = [
        ShortcutAction::PauseResume,
        ShortcutAction::Reset,
        ShortcutAction::ShowHide,
        ShortcutAction::OpenSettings,
        ShortcutAction::LockUnlock,
        ShortcutAction::ToggleFullscreen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShortcutAction::PauseResume => "pause_resume",
            ShortcutAction::Reset => "reset",
            ShortcutAction::ShowHide => "show_hide",
            ShortcutAction::OpenSettings => "open_settings",
            ShortcutAction::LockUnlock => "lock_unlock",
            ShortcutAction::ToggleFullscreen => "toggle_fullscreen",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

/// A parsed key chord
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    /// Key name in `KeyboardEvent.code` form: `KeyR`, `Digit1`, `Space`, `F11`
    pub key: String,
}

impl fmt::Display for Chord {
    /// Accelerator text understood by `global_hotkey::hotkey::HotKey::from_str`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (held, name) in [
            (self.ctrl, "control"),
            (self.shift, "shift"),
            (self.alt, "alt"),
            (self.meta, "super"),
        ] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        f.write_str(&self.key)
    }
}

fn key_code(upper: &str) -> Option<String> {
    let named = match upper {
        "SPACE" => "Space",
        "TAB" => "Tab",
        "ENTER" | "RETURN" => "Enter",
        "ESC" | "ESCAPE" => "Escape",
        "DEL" | "DELETE" => "Delete",
        "BACKSPACE" => "Backspace",
        "INSERT" | "INS" => "Insert",
        "HOME" => "Home",
        "END" => "End",
        "PAGEUP" | "PGUP" => "PageUp",
        "PAGEDOWN" | "PGDN" => "PageDown",
        "UP" => "ArrowUp",
        "DOWN" => "ArrowDown",
        "LEFT" => "ArrowLeft",
        "RIGHT" => "ArrowRight",
        "," | "COMMA" => "Comma",
        "." | "PERIOD" => "Period",
        "-" | "MINUS" => "Minus",
        "=" | "EQUAL" => "Equal",
        "/" | "SLASH" => "Slash",
        "\\" | "BACKSLASH" => "Backslash",
        ";" | "SEMICOLON" => "Semicolon",
        "'" | "QUOTE" => "Quote",
        "[" | "BRACKETLEFT" => "BracketLeft",
        "]" | "BRACKETRIGHT" => "BracketRight",
        "`" | "BACKQUOTE" => "Backquote",
        _ => "",
    };
    if !named.is_empty() {
        return Some(named.to_string());
    }

    if let Some(number) = upper.strip_prefix('F') {
        if let Ok(n) = number.parse::<u8>() {
            return (1..=24).contains(&n).then(|| format!("F{}", n));
        }
    }

    let mut chars = upper.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(format!("Key{}", c)),
        (Some(c), None) if c.is_ascii_digit() => Some(format!("Digit{}", c)),
        _ => None,
    }
}

/// Parse chord text like `Ctrl+Shift+R`; exactly one non-modifier key is required
pub fn parse_chord(text: &str) -> Option<Chord> {
    let mut chord = Chord {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
        key: String::new(),
    };

    for part in text.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" => chord.ctrl = true,
            "SHIFT" => chord.shift = true,
            "ALT" | "OPTION" => chord.alt = true,
            "META" | "SUPER" | "WIN" | "CMD" | "COMMAND" => chord.meta = true,
            "" => return None,
            _ => {
                if !chord.key.is_empty() {
                    return None;
                }
                chord.key = key_code(&upper)?;
            }
        }
    }

    (!chord.key.is_empty()).then_some(chord)
}

#[cfg(feature = "tray")]
pub use registration::HotkeyManager;

#[cfg(feature = "tray")]
mod registration {
    use super::{parse_chord, ShortcutAction};
    use anyhow::{anyhow, Context, Result};
    use global_hotkey::{hotkey::HotKey, GlobalHotKeyManager};
    use log::{info, warn};
    use std::collections::{BTreeMap, HashMap};

    pub struct HotkeyManager {
        manager: GlobalHotKeyManager,
        bindings: HashMap<u32, (HotKey, ShortcutAction)>,
    }

    impl HotkeyManager {
        pub fn new() -> Result<Self> {
            let manager =
                GlobalHotKeyManager::new().context("Failed to create global hotkey manager")?;

            Ok(Self {
                manager,
                bindings: HashMap::new(),
            })
        }

        fn register_one(&mut self, action: ShortcutAction, text: &str) -> Result<()> {
            let chord = parse_chord(text)
                .ok_or_else(|| anyhow!("Unrecognized key chord '{}'", text))?;
            let hotkey: HotKey = chord
                .to_string()
                .parse()
                .map_err(|e| anyhow!("{:?}", e))
                .with_context(|| format!("Invalid key chord '{}'", text))?;

            self.manager
                .register(hotkey)
                .with_context(|| format!("Failed to register hotkey {}", text))?;

            self.bindings.insert(hotkey.id(), (hotkey, action));
            info!("Hotkey registered: {} -> {}", text, action.name());
            Ok(())
        }

        /// Register every known action from the `shortcuts` setting
        ///
        /// Unknown actions and unusable chords are skipped with a warning.
        /// Returns the number of registered hot-keys.
        pub fn register_shortcuts(&mut self, shortcuts: &BTreeMap<String, String>) -> usize {
            for (name, text) in shortcuts {
                let Some(action) = ShortcutAction::from_name(name) else {
                    warn!("Ignoring shortcut for unknown action '{}'", name);
                    continue;
                };
                if text.trim().is_empty() {
                    continue;
                }
                if let Err(e) = self.register_one(action, text) {
                    warn!("{:#}", e);
                }
            }
            self.bindings.len()
        }

        /// Look up the action bound to a hot-key event
        pub fn action_for(&self, event_id: u32) -> Option<ShortcutAction> {
            self.bindings.get(&event_id).map(|(_, action)| *action)
        }

        pub fn unregister_all(&mut self) -> Result<()> {
            for (_, (hotkey, _)) in self.bindings.drain() {
                self.manager.unregister(hotkey)?;
            }
            Ok(())
        }
    }
}
