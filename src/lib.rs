// Library interface for DeskTimer
// The core shared by the terminal front end and the tray app

pub mod app_state;
pub mod config;
pub mod constants;
pub mod hotkeys;
pub mod i18n;
pub mod notifications;
pub mod settings;
pub mod settings_store;
pub mod timer;

use app_state::AppState;
use constants::{FLASH_INTERVAL_MS, TICK_INTERVAL_MS};
use hotkeys::ShortcutAction;
use i18n::{Catalog, Language};
use log::{debug, info};
use settings::presets::{duration_text, parse_duration_input, validate_preset_input};
use settings::{CountdownDuration, CountdownPreset, ModeKey, PresetInputError, Settings};
use settings_store::SettingsStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use timer::format::{format_clock, format_hms, WallClock};

pub use timer::{CountdownFinished, Notice, TimerListener, TimerSession, TrayStatus};

/// Next deadline after `due`; a deadline that has already slipped into the
/// past is re-based on `now` instead of being replayed
fn next_deadline(due: Instant, now: Instant, interval: Duration) -> Instant {
    let next = due + interval;
    if next <= now {
        now + interval
    } else {
        next
    }
}

/// Core DeskTimer state driven by the front end's event loop
///
/// Everything runs on the caller's thread: `poll(now)` applies due ticks,
/// flash steps and debounced saves, and `next_wakeup()` tells the loop how
/// long it may sleep.
pub struct DeskTimer {
    store: SettingsStore,
    session: TimerSession,
    window: AppState,
    catalog: Arc<Catalog>,
    clock: Box<dyn WallClock>,
    listeners: Vec<Box<dyn TimerListener>>,
    next_tick: Instant,
    next_flash: Option<Instant>,
}

impl DeskTimer {
    pub fn new(
        mut store: SettingsStore,
        catalog: Arc<Catalog>,
        clock: Box<dyn WallClock>,
        now: Instant,
    ) -> Self {
        let startup_mode = store.settings().startup_mode();
        if startup_mode != store.settings().timer_mode_key {
            info!("Starting in fixed mode: {}", startup_mode);
            store.settings_mut().set_mode(startup_mode, &catalog);
        }

        let settings = store.settings();
        let session = TimerSession::new(
            startup_mode,
            settings.countdown_duration(),
            settings.auto_start_timer,
        );
        info!(
            "Timer ready: mode={}, running={}",
            session.mode(),
            session.is_running()
        );

        Self {
            store,
            session,
            window: AppState::new(),
            catalog,
            clock,
            listeners: Vec::new(),
            next_tick: now + Duration::from_millis(TICK_INTERVAL_MS),
            next_flash: None,
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn TimerListener>) {
        self.listeners.push(listener);
    }

    /// Apply everything that is due at `now`
    pub fn poll(&mut self, now: Instant) {
        if now >= self.next_tick {
            self.tick(now);
        }

        if let Some(due) = self.next_flash {
            if now >= due {
                let interval = Duration::from_millis(FLASH_INTERVAL_MS);
                self.next_flash = self
                    .session
                    .flash_step()
                    .then(|| next_deadline(due, now, interval));
            }
        }

        self.store.poll(now);
    }

    /// Earliest instant at which `poll` has work to do
    pub fn next_wakeup(&self) -> Instant {
        [self.next_flash, self.store.next_deadline()]
            .into_iter()
            .flatten()
            .fold(self.next_tick, Instant::min)
    }

    /// Apply one second and schedule the next tick
    pub fn tick(&mut self, now: Instant) {
        self.next_tick = next_deadline(
            self.next_tick,
            now,
            Duration::from_millis(TICK_INTERVAL_MS),
        );

        let finished = self.session.tick();
        let display = self.display_text();
        debug!("Tick: {}", display);
        for listener in self.listeners.iter_mut() {
            listener.on_tick(&display);
        }

        if finished {
            self.finish_countdown(now);
        }
    }

    fn finish_countdown(&mut self, now: Instant) {
        let event = CountdownFinished::from_settings(self.store.settings());
        info!("Countdown finished: action={}", event.action);
        if event.flash {
            self.session.start_flash();
            self.next_flash = Some(now + Duration::from_millis(FLASH_INTERVAL_MS));
        }
        for listener in self.listeners.iter_mut() {
            listener.on_countdown_finished(&event);
        }
    }

    fn notice(&mut self, title: String, body: String) {
        let notice = Notice { title, body };
        for listener in self.listeners.iter_mut() {
            listener.on_notice(&notice);
        }
    }

    fn notice_key(&mut self, body_key: &str) {
        let title = self.translate("app_name").to_string();
        let body = self.translate(body_key).to_string();
        self.notice(title, body);
    }

    /// Pause or resume; a no-op in clock mode. Returns the running state.
    pub fn toggle_pause(&mut self) -> bool {
        if self.session.mode() == ModeKey::Clock {
            return false;
        }
        let was_running = self.session.is_running();
        let running = self.session.toggle_pause();
        if running != was_running {
            info!("Timer {}", if running { "resumed" } else { "paused" });
            self.notice_key(if running { "timer_continued" } else { "timer_paused" });
        }
        running
    }

    /// Start counting if not already running
    pub fn start(&mut self) {
        self.session.start();
    }

    /// Countdown reloads its configured duration, other modes go to zero
    pub fn reset(&mut self) {
        self.session.reset(self.store.settings().countdown_duration());
        self.next_flash = None;
        info!("Timer reset");
        self.notice_key("timer_reset");
    }

    /// Switch mode, persist it (debounced) and reset
    pub fn switch_mode(&mut self, mode: ModeKey, now: Instant) {
        let catalog = &self.catalog;
        self.store.update(false, now, |s| s.set_mode(mode, catalog));
        self.session.set_mode(mode, self.store.settings().countdown_duration());
        self.next_flash = None;
        info!("Switched to {} mode", mode);
    }

    /// Force countdown mode with the given (clamped) duration
    pub fn apply_preset(&mut self, hours: i64, minutes: i64, seconds: i64, now: Instant) {
        let duration = CountdownDuration::clamped(hours, minutes, seconds);
        self.apply_duration(duration, now);
    }

    fn apply_duration(&mut self, duration: CountdownDuration, now: Instant) {
        let catalog = &self.catalog;
        self.store.update(false, now, |s| {
            s.set_mode(ModeKey::Countdown, catalog);
            s.set_countdown_duration(duration);
        });
        self.session.set_mode(ModeKey::Countdown, duration);
        self.next_flash = None;
        info!("Countdown set to {}s", duration.total_seconds());

        let title = self.translate("countdown_set").to_string();
        let body = duration_text(duration, &self.catalog, self.language());
        self.notice(title, body);
    }

    /// Apply a saved preset; false when no preset has this id
    pub fn apply_preset_by_id(&mut self, id: &str, now: Instant) -> bool {
        let Some(duration) = self.store.settings().preset(id).map(CountdownPreset::duration) else {
            log::warn!("No countdown preset with id '{}'", id);
            return false;
        };
        self.apply_duration(duration, now);
        true
    }

    /// Apply a duration typed by the user; state is untouched on error
    pub fn start_custom_countdown(
        &mut self,
        hours: &str,
        minutes: &str,
        seconds: &str,
        now: Instant,
    ) -> Result<CountdownDuration, PresetInputError> {
        let duration = parse_duration_input(hours, minutes, seconds)?;
        self.apply_duration(duration, now);
        Ok(duration)
    }

    /// Validate and store a new preset, saving immediately
    pub fn add_preset(
        &mut self,
        label: &str,
        hours: &str,
        minutes: &str,
        seconds: &str,
        now: Instant,
    ) -> Result<CountdownPreset, PresetInputError> {
        let preset = validate_preset_input(label, hours, minutes, seconds, self.language())?;
        let added = preset.clone();
        self.store
            .update(true, now, |s| s.countdown_presets.push(preset));
        info!("Added countdown preset '{}'", added.id);
        Ok(added)
    }

    /// Remove a preset by id; the list falls back to built-ins if emptied
    pub fn remove_preset(&mut self, id: &str, now: Instant) -> bool {
        if self.store.settings().preset(id).is_none() {
            return false;
        }
        self.store.update(true, now, |s| {
            s.countdown_presets.retain(|preset| preset.id != id);
        });
        true
    }

    /// Replace settings the way the settings dialog's Apply/OK does
    ///
    /// The document is re-validated and written immediately. A changed mode
    /// or countdown duration resets the timer.
    pub fn update_settings<F>(&mut self, now: Instant, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let old_mode = self.store.settings().timer_mode_key;
        let old_duration = self.store.settings().countdown_duration();

        self.store.update(true, now, |s| {
            f(s);
            s.validate_and_fix();
        });

        let settings = self.store.settings();
        if settings.timer_mode_key != old_mode || settings.countdown_duration() != old_duration {
            let (mode, duration) = (settings.timer_mode_key, settings.countdown_duration());
            self.session.set_mode(mode, duration);
            self.next_flash = None;
        }
    }

    /// Dispatch a keyboard shortcut; false when the front end must handle it
    pub fn handle_shortcut(&mut self, action: ShortcutAction) -> bool {
        debug!("Shortcut: {}", action.name());
        match action {
            ShortcutAction::PauseResume => {
                self.toggle_pause();
            }
            ShortcutAction::Reset => self.reset(),
            ShortcutAction::ShowHide => {
                self.toggle_visible();
            }
            ShortcutAction::LockUnlock => {
                self.toggle_lock();
            }
            ShortcutAction::ToggleFullscreen => {
                self.toggle_fullscreen();
            }
            ShortcutAction::OpenSettings => return false,
        }
        true
    }

    /// Returns the new lock state
    pub fn toggle_lock(&mut self) -> bool {
        let locked = self.window.toggle_locked();
        self.notice_key(if locked { "window_locked" } else { "window_unlocked" });
        locked
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.window.toggle_fullscreen()
    }

    pub fn toggle_visible(&mut self) -> bool {
        let visible = self.window.toggle_visible();
        if !visible {
            self.notice_key("minimized_to_tray");
        }
        visible
    }

    /// Current overlay text: `HH:MM:SS` or the formatted wall clock
    pub fn display_text(&self) -> String {
        match self.session.mode() {
            ModeKey::Clock => {
                format_clock(&self.clock.now(), &self.store.settings().clock_format())
            }
            ModeKey::CountUp | ModeKey::Countdown => format_hms(self.session.seconds()),
        }
    }

    pub fn mode(&self) -> ModeKey {
        self.session.mode()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn is_flashing(&self) -> bool {
        self.session.is_flashing()
    }

    pub fn accent_visible(&self) -> bool {
        self.session.accent_visible()
    }

    pub fn tray_status(&self) -> TrayStatus {
        self.session.tray_status()
    }

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        self.store.settings()
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn language(&self) -> Language {
        self.store.settings().language
    }

    /// Translate `key` into the configured language
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.catalog.translate(self.language(), key)
    }

    pub fn window(&self) -> &AppState {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut AppState {
        &mut self.window
    }

    /// Ask the front end to exit
    pub fn quit(&mut self) {
        info!("Quit requested");
        self.window.request_exit();
    }

    /// Flush unsaved settings; call once before exiting
    pub fn shutdown(&mut self) {
        if self.store.flush() {
            info!("Settings flushed on shutdown");
        }
    }
}
