//! Desktop notifications via notify-rust

use crate::constants::{APP_DISPLAY_NAME, NOTIFICATION_LONG_MS, TRAY_MESSAGE_MS};
use crate::i18n::{Catalog, Language};
use crate::timer::{CountdownFinished, Notice, TimerListener};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Show a desktop notification
pub fn show_notification(summary: &str, body: &str, timeout_ms: u32) -> Result<()> {
    notify_rust::Notification::new()
        .appname(APP_DISPLAY_NAME)
        .summary(summary)
        .body(body)
        .timeout(notify_rust::Timeout::Milliseconds(timeout_ms))
        .show()
        .with_context(|| format!("Failed to show notification '{}'", summary))?;
    Ok(())
}

/// Title and body of the countdown-finished notification
pub fn finished_message(catalog: &Catalog, lang: Language) -> (String, String) {
    (
        catalog.translate(lang, "countdown_finished").to_string(),
        catalog.translate(lang, "countdown_finished_msg").to_string(),
    )
}

/// Forwards timer events to the desktop notification service
///
/// Failures are logged; a missing notification daemon never stops the timer.
/// Text is localized per event, so a language change applies to the next toast.
pub struct DesktopNotifier {
    catalog: Arc<Catalog>,
    /// Whether status notices (paused, reset, ...) are shown as well
    show_notices: bool,
}

impl DesktopNotifier {
    pub fn new(catalog: Arc<Catalog>, show_notices: bool) -> Self {
        Self {
            catalog,
            show_notices,
        }
    }
}

impl TimerListener for DesktopNotifier {
    fn on_countdown_finished(&mut self, event: &CountdownFinished) {
        // Without the popup the notification is the only visible alert
        if !event.show_toast && event.show_popup {
            return;
        }
        let (title, body) = finished_message(&self.catalog, event.language);
        if let Err(e) = show_notification(&title, &body, NOTIFICATION_LONG_MS) {
            log::warn!("{:#}", e);
        }
    }

    fn on_notice(&mut self, notice: &Notice) {
        if !self.show_notices {
            return;
        }
        if let Err(e) = show_notification(&notice.title, &notice.body, TRAY_MESSAGE_MS) {
            log::debug!("{:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_message_is_localized() {
        let catalog = Catalog::builtin();
        let (title, body) = finished_message(&catalog, Language::EnUs);
        assert_eq!(title, "Countdown Finished");
        assert_eq!(body, "Time's up!");
        let (title, _) = finished_message(&catalog, Language::ZhCn);
        assert_eq!(title, "倒计时结束");
    }
}
