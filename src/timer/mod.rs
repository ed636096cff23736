//! Timer state machine
//!
//! `TimerSession` holds the transient counter state. It knows nothing about
//! wall time: the caller decides when a one-second tick or a flash step is
//! due and the session only applies it.

pub mod flash;
pub mod format;

use crate::i18n::Language;
use crate::settings::{ActionKey, CountdownDuration, ModeKey, Settings};
use flash::Flash;

/// What the tray icon should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayStatus {
    Flashing,
    Running,
    Stopped,
    Paused,
}

/// Side effects requested when a countdown reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownFinished {
    pub action: ActionKey,
    pub play_sound: bool,
    pub flash: bool,
    /// When false the front end falls back to a tray message
    pub show_popup: bool,
    pub show_toast: bool,
    /// Language configured when the countdown finished
    pub language: Language,
}

impl CountdownFinished {
    pub fn from_settings(settings: &Settings) -> Self {
        let action = settings.countdown_action_key;
        Self {
            action,
            play_sound: settings.enable_sound && action.beeps(),
            flash: action.flashes(),
            show_popup: settings.enable_popup,
            show_toast: settings.enable_windows_toast,
            language: settings.language,
        }
    }
}

/// Short localized status message ("Timer paused", "Countdown set", ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

/// Observer of timer events; every callback defaults to a no-op
pub trait TimerListener {
    /// Called after every applied tick with the new display text
    fn on_tick(&mut self, _display: &str) {}

    /// Called exactly once per countdown that reaches zero
    fn on_countdown_finished(&mut self, _event: &CountdownFinished) {}

    /// Called after user actions that the tray reports as a balloon message
    fn on_notice(&mut self, _notice: &Notice) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSession {
    mode: ModeKey,
    /// Elapsed seconds when counting up, remaining seconds when counting down
    seconds: u64,
    running: bool,
    flash: Flash,
}

impl TimerSession {
    pub fn new(mode: ModeKey, countdown: CountdownDuration, running: bool) -> Self {
        let mut session = Self {
            mode,
            seconds: 0,
            running: false,
            flash: Flash::default(),
        };
        session.reset(countdown);
        if running {
            session.start();
        }
        session
    }

    pub fn mode(&self) -> ModeKey {
        self.mode
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reload the counter for the current mode and stop
    pub fn reset(&mut self, countdown: CountdownDuration) {
        self.seconds = match self.mode {
            ModeKey::Countdown => countdown.total_seconds(),
            ModeKey::CountUp | ModeKey::Clock => 0,
        };
        self.running = false;
        self.flash.stop();
    }

    pub fn set_mode(&mut self, mode: ModeKey, countdown: CountdownDuration) {
        self.mode = mode;
        self.reset(countdown);
    }

    fn can_run(&self) -> bool {
        match self.mode {
            ModeKey::CountUp => true,
            ModeKey::Countdown => self.seconds > 0,
            ModeKey::Clock => false,
        }
    }

    /// Start counting; ignored in clock mode and for an exhausted countdown
    pub fn start(&mut self) {
        if self.can_run() {
            self.running = true;
        }
    }

    /// Flip running/paused; returns the new running state
    pub fn toggle_pause(&mut self) -> bool {
        if self.running {
            self.running = false;
        } else {
            self.start();
        }
        self.running
    }

    /// Apply one second; returns true when this tick finished a countdown
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        match self.mode {
            ModeKey::CountUp => {
                self.seconds = self.seconds.saturating_add(1);
                false
            }
            ModeKey::Countdown => {
                self.seconds = self.seconds.saturating_sub(1);
                if self.seconds == 0 {
                    self.running = false;
                    log::info!("Countdown finished");
                    return true;
                }
                false
            }
            ModeKey::Clock => false,
        }
    }

    pub fn start_flash(&mut self) {
        self.flash.start();
    }

    /// Returns whether flashing continues after this step
    pub fn flash_step(&mut self) -> bool {
        self.flash.step()
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_active()
    }

    pub fn accent_visible(&self) -> bool {
        self.flash.accent_visible()
    }

    pub fn tray_status(&self) -> TrayStatus {
        if self.is_flashing() {
            TrayStatus::Flashing
        } else if self.running {
            TrayStatus::Running
        } else if self.seconds == 0 {
            TrayStatus::Stopped
        } else {
            TrayStatus::Paused
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(seconds: u32) -> CountdownDuration {
        CountdownDuration {
            hours: 0,
            minutes: 0,
            seconds,
        }
    }

    #[test]
    fn test_new_session_loads_countdown() {
        let session = TimerSession::new(ModeKey::Countdown, secs(30), false);
        assert_eq!(session.seconds(), 30);
        assert!(!session.is_running());

        let session = TimerSession::new(ModeKey::CountUp, secs(30), true);
        assert_eq!(session.seconds(), 0);
        assert!(session.is_running());
    }

    #[test]
    fn test_countdown_finishes_once() {
        let mut session = TimerSession::new(ModeKey::Countdown, secs(2), true);
        assert!(!session.tick());
        assert!(session.tick());
        assert_eq!(session.seconds(), 0);
        assert!(!session.is_running());
        assert!(!session.tick());
        assert_eq!(session.seconds(), 0);
    }

    #[test]
    fn test_clock_mode_ignores_pause_and_tick() {
        let mut session = TimerSession::new(ModeKey::Clock, secs(5), true);
        assert!(!session.is_running());
        assert!(!session.toggle_pause());
        assert!(!session.tick());
        assert_eq!(session.seconds(), 0);
    }

    #[test]
    fn test_exhausted_countdown_does_not_restart() {
        let mut session = TimerSession::new(ModeKey::Countdown, secs(0), false);
        assert!(!session.toggle_pause());
        assert_eq!(session.tray_status(), TrayStatus::Stopped);
    }

    #[test]
    fn test_tray_status_priority() {
        let mut session = TimerSession::new(ModeKey::CountUp, secs(0), false);
        assert_eq!(session.tray_status(), TrayStatus::Stopped);
        session.toggle_pause();
        assert_eq!(session.tray_status(), TrayStatus::Running);
        session.tick();
        session.toggle_pause();
        assert_eq!(session.tray_status(), TrayStatus::Paused);
        session.start_flash();
        assert_eq!(session.tray_status(), TrayStatus::Flashing);
    }

    #[test]
    fn test_reset_stops_flash() {
        let mut session = TimerSession::new(ModeKey::Countdown, secs(1), true);
        assert!(session.tick());
        session.start_flash();
        session.reset(secs(10));
        assert!(!session.is_flashing());
        assert_eq!(session.seconds(), 10);
    }

    #[test]
    fn test_finished_event_from_settings() {
        let settings = Settings {
            countdown_action_key: ActionKey::BeepFlash,
            enable_sound: false,
            enable_popup: false,
            ..Settings::default()
        };
        let event = CountdownFinished::from_settings(&settings);
        assert!(!event.play_sound);
        assert!(event.flash);
        assert!(!event.show_popup);
        assert!(event.show_toast);

        let event = CountdownFinished::from_settings(&Settings::default());
        assert!(event.play_sound);
        assert!(!event.flash);
    }
}
