//! Inference of language-independent keys from legacy localized text
//!
//! Releases before the `*_key` fields stored only the label shown in the
//! UI ("正计时", "Count Up", "提示音+闪烁", ...). These helpers map such
//! text back onto the typed keys.

use super::{ActionKey, ModeKey};
use crate::i18n::Catalog;

const COUNT_UP_KEYWORDS: &[&str] = &["count up", "正计时"];
const CLOCK_KEYWORDS: &[&str] = &["clock", "时钟"];
const BEEP_KEYWORDS: &[&str] = &["beep", "sound", "提示音", "铃声"];
const FLASH_KEYWORDS: &[&str] = &["flash", "闪烁"];

fn mentions(text_lower: &str, builtin: &[&str], catalog: &Catalog, phrase_key: &str) -> bool {
    builtin.iter().any(|keyword| text_lower.contains(keyword))
        || catalog
            .phrases(phrase_key)
            .any(|phrase| text_lower.contains(&phrase.to_lowercase()))
}

/// Infer the timer mode from free text; anything unrecognised is a countdown
pub fn derive_mode_key(mode_text: &str, catalog: &Catalog) -> ModeKey {
    if let Some(key) = ModeKey::parse(mode_text) {
        return key;
    }
    let text_lower = mode_text.to_lowercase();

    if mentions(&text_lower, COUNT_UP_KEYWORDS, catalog, "count_up_mode") {
        return ModeKey::CountUp;
    }
    if mentions(&text_lower, CLOCK_KEYWORDS, catalog, "clock_mode") {
        return ModeKey::Clock;
    }
    ModeKey::Countdown
}

/// Infer the countdown-finished action from free text
///
/// Beep-like and flash-like wording are detected independently; text
/// mentioning neither falls back to a plain beep.
pub fn derive_action_key(action_text: &str, catalog: &Catalog) -> ActionKey {
    if let Some(key) = ActionKey::parse(action_text) {
        return key;
    }
    let text_lower = action_text.to_lowercase();

    let has_beep = mentions(&text_lower, BEEP_KEYWORDS, catalog, "action_beep");
    let has_flash = mentions(&text_lower, FLASH_KEYWORDS, catalog, "action_flash");
    match (has_beep, has_flash) {
        (true, true) => ActionKey::BeepFlash,
        (false, true) => ActionKey::Flash,
        _ => ActionKey::Beep,
    }
}
