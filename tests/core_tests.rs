use chrono::{NaiveDate, NaiveDateTime};
use desktimer::hotkeys::ShortcutAction;
use desktimer::i18n::{Catalog, Language};
use desktimer::settings::{ActionKey, ModeKey, PresetInputError, Settings, StartupBehavior};
use desktimer::settings_store::SettingsStore;
use desktimer::timer::format::FixedClock;
use desktimer::{CountdownFinished, DeskTimer, Notice, TimerListener, TrayStatus};
use serde_json::Value;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Recorded {
    ticks: Vec<String>,
    finished: Vec<CountdownFinished>,
    notices: Vec<Notice>,
}

struct Recorder(Rc<RefCell<Recorded>>);

impl TimerListener for Recorder {
    fn on_tick(&mut self, display: &str) {
        self.0.borrow_mut().ticks.push(display.to_string());
    }

    fn on_countdown_finished(&mut self, event: &CountdownFinished) {
        self.0.borrow_mut().finished.push(*event);
    }

    fn on_notice(&mut self, notice: &Notice) {
        self.0.borrow_mut().notices.push(notice.clone());
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    path: PathBuf,
    core: DeskTimer,
    events: Rc<RefCell<Recorded>>,
    start: Instant,
}

impl Harness {
    fn at(&self, millis: u64) -> Instant {
        self.start + Duration::from_millis(millis)
    }

    fn on_disk(&self) -> Value {
        read_json(&self.path)
    }
}

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(14, 5, 9)
        .unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Build a core over a settings file derived from the defaults
fn harness(configure: impl FnOnce(&mut Settings)) -> Harness {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = SettingsStore::settings_path(dir.path());
    let mut settings = Settings::default();
    settings.language = Language::EnUs;
    configure(&mut settings);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

    let catalog = Arc::new(Catalog::builtin());
    let store = SettingsStore::open(path.clone(), &catalog);
    let start = Instant::now();
    let mut core = DeskTimer::new(store, catalog, Box::new(FixedClock(noon())), start);
    let events = Rc::new(RefCell::new(Recorded::default()));
    core.subscribe(Box::new(Recorder(Rc::clone(&events))));

    Harness {
        _dir: dir,
        path,
        core,
        events,
        start,
    }
}

fn three_second_countdown(settings: &mut Settings) {
    settings.countdown_hours = 0;
    settings.countdown_minutes = 0;
    settings.countdown_seconds = 3;
    settings.auto_start_timer = true;
}

#[test]
fn test_countdown_runs_to_zero_once() {
    let mut h = harness(three_second_countdown);
    assert_eq!(h.core.display_text(), "00:00:03");

    for second in 1..=4 {
        h.core.poll(h.at(second * 1000));
    }

    let events = h.events.borrow();
    assert_eq!(
        events.ticks,
        vec!["00:00:02", "00:00:01", "00:00:00", "00:00:00"]
    );
    assert_eq!(events.finished.len(), 1);
    assert_eq!(events.finished[0].action, ActionKey::Beep);
    assert!(events.finished[0].play_sound);
    assert!(!h.core.is_running());
}

#[test]
fn test_poll_before_deadline_does_nothing() {
    let mut h = harness(three_second_countdown);
    h.core.poll(h.at(999));
    assert!(h.events.borrow().ticks.is_empty());
    assert_eq!(h.core.next_wakeup(), h.at(1000));
}

#[test]
fn test_missed_ticks_are_not_replayed() {
    let mut h = harness(|s| {
        s.timer_mode_key = ModeKey::CountUp;
        s.auto_start_timer = true;
    });

    h.core.poll(h.at(5500));
    assert_eq!(h.core.display_text(), "00:00:01");
    assert_eq!(h.core.next_wakeup(), h.at(6500));
}

#[test]
fn test_flash_follows_finish_and_stops() {
    let mut h = harness(|s| {
        three_second_countdown(s);
        s.countdown_action_key = ActionKey::Flash;
    });

    for second in 1..=3 {
        h.core.poll(h.at(second * 1000));
    }
    assert!(h.core.is_flashing());
    assert_eq!(h.core.tray_status(), TrayStatus::Flashing);
    assert!(!h.events.borrow().finished[0].play_sound);
    assert_eq!(h.core.next_wakeup(), h.at(3500));

    let mut visible = Vec::new();
    for step in 1..=6 {
        h.core.poll(h.at(3000 + step * 500));
        visible.push(h.core.accent_visible());
    }
    assert_eq!(visible, vec![true, false, true, false, true, false]);
    assert!(!h.core.is_flashing());
    assert_eq!(h.core.tray_status(), TrayStatus::Stopped);
}

#[test]
fn test_reset_stops_flashing() {
    let mut h = harness(|s| {
        three_second_countdown(s);
        s.countdown_action_key = ActionKey::BeepFlash;
    });
    for second in 1..=3 {
        h.core.poll(h.at(second * 1000));
    }
    assert!(h.core.is_flashing());

    h.core.reset();
    assert!(!h.core.is_flashing());
    assert_eq!(h.core.display_text(), "00:00:03");
    assert_eq!(h.core.next_wakeup(), h.at(4000));
}

#[test]
fn test_switch_mode_is_saved_after_debounce() {
    let mut h = harness(|_| {});
    h.core.switch_mode(ModeKey::CountUp, h.at(0));
    assert_eq!(h.core.mode(), ModeKey::CountUp);
    assert_eq!(h.core.display_text(), "00:00:00");
    assert!(!h.core.is_running());
    assert_eq!(h.on_disk()["timer_mode_key"], "countdown");

    h.core.switch_mode(ModeKey::Clock, h.at(400));
    h.core.poll(h.at(1000));
    assert_eq!(h.on_disk()["timer_mode_key"], "countdown");

    h.core.poll(h.at(1400));
    assert_eq!(h.on_disk()["timer_mode_key"], "clock");
    assert_eq!(h.on_disk()["timer_mode"], "Clock");
}

#[test]
fn test_shutdown_flushes_pending_save() {
    let mut h = harness(|_| {});
    h.core.switch_mode(ModeKey::CountUp, h.at(0));
    h.core.shutdown();
    assert_eq!(h.on_disk()["timer_mode_key"], "countup");
    assert!(!h.core.store().is_dirty());
}

#[test]
fn test_clock_mode_shows_wall_clock() {
    let mut h = harness(|s| {
        s.timer_mode_key = ModeKey::Clock;
        s.clock_format_24h = false;
        s.clock_show_am_pm = false;
    });
    assert_eq!(h.core.display_text(), "02:05:09");

    assert!(!h.core.toggle_pause());
    assert!(h.events.borrow().notices.is_empty());
    h.core.poll(h.at(1000));
    assert_eq!(h.events.borrow().ticks, vec!["02:05:09"]);
}

#[test]
fn test_fixed_startup_mode_overrides_saved_mode() {
    let h = harness(|s| {
        s.timer_mode_key = ModeKey::CountUp;
        s.startup_mode_behavior = StartupBehavior::Fixed;
        s.startup_fixed_mode_key = ModeKey::Clock;
    });
    assert_eq!(h.core.mode(), ModeKey::Clock);
    assert_eq!(h.core.display_text(), "14:05:09");
}

#[test]
fn test_auto_start_flag() {
    let idle = harness(|_| {});
    assert!(!idle.core.is_running());
    assert_eq!(idle.core.display_text(), "00:25:00");
    assert_eq!(idle.core.tray_status(), TrayStatus::Paused);

    let running = harness(|s| s.auto_start_timer = true);
    assert!(running.core.is_running());
    assert_eq!(running.core.tray_status(), TrayStatus::Running);
}

#[test]
fn test_apply_preset_forces_countdown() {
    let mut h = harness(|s| s.timer_mode_key = ModeKey::CountUp);
    h.core.apply_preset(0, 90, -3, h.at(0));

    assert_eq!(h.core.mode(), ModeKey::Countdown);
    assert_eq!(h.core.display_text(), "00:59:00");
    assert!(!h.core.is_running());

    let notices = &h.events.borrow().notices;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Countdown set");
}

#[test]
fn test_apply_preset_by_id() {
    let mut h = harness(|_| {});
    assert!(h.core.apply_preset_by_id("builtin_pomodoro", h.at(0)));
    assert_eq!(h.core.display_text(), "00:25:00");
    assert!(!h.core.apply_preset_by_id("no_such_preset", h.at(0)));

    h.core.shutdown();
    assert_eq!(h.on_disk()["countdown_minutes"], 25);
}

#[test]
fn test_custom_countdown_errors_leave_state_untouched() {
    let mut h = harness(|s| s.timer_mode_key = ModeKey::CountUp);

    assert_eq!(
        h.core.start_custom_countdown("0", "0", "0", h.at(0)),
        Err(PresetInputError::ZeroDuration)
    );
    assert!(matches!(
        h.core.start_custom_countdown("x", "1", "0", h.at(0)),
        Err(PresetInputError::InvalidNumber { .. })
    ));
    assert_eq!(h.core.mode(), ModeKey::CountUp);
    assert!(!h.core.store().is_dirty());
    assert!(h.events.borrow().notices.is_empty());

    let duration = h.core.start_custom_countdown("", "1", "30", h.at(0)).unwrap();
    assert_eq!(duration.total_seconds(), 90);
    assert_eq!(h.core.display_text(), "00:01:30");
}

#[test]
fn test_add_and_remove_presets_save_immediately() {
    let mut h = harness(|_| {});
    let preset = h.core.add_preset("Tea", "0", "4", "0", h.at(0)).unwrap();
    assert!(preset.id.starts_with("preset_"));

    let saved = h.on_disk();
    let presets = saved["countdown_presets"].as_array().unwrap();
    assert_eq!(presets.len(), 12);
    assert_eq!(presets[11]["labels"]["en_US"], "Tea");

    assert_eq!(
        h.core.add_preset("  ", "0", "4", "0", h.at(0)).unwrap_err(),
        PresetInputError::EmptyLabel
    );

    assert!(h.core.remove_preset(&preset.id, h.at(0)));
    assert!(!h.core.remove_preset(&preset.id, h.at(0)));
    assert_eq!(
        h.on_disk()["countdown_presets"].as_array().unwrap().len(),
        11
    );
}

#[test]
fn test_update_settings_resets_on_duration_change() {
    let mut h = harness(|s| s.auto_start_timer = true);
    h.core.poll(h.at(1000));
    assert_eq!(h.core.display_text(), "00:24:59");

    h.core.update_settings(h.at(1000), |s| s.font_size = 80);
    assert_eq!(h.core.display_text(), "00:24:59");

    h.core.update_settings(h.at(1000), |s| {
        s.countdown_minutes = 10;
        s.bg_opacity = 999;
    });
    assert_eq!(h.core.display_text(), "00:10:00");
    assert!(!h.core.is_running());
    assert_eq!(h.on_disk()["bg_opacity"], 200);
    assert_eq!(h.on_disk()["font_size"], 80);
}

#[test]
fn test_pause_notices() {
    let mut h = harness(|s| s.timer_mode_key = ModeKey::CountUp);
    assert!(h.core.toggle_pause());
    assert!(!h.core.toggle_pause());
    h.core.reset();

    let bodies: Vec<String> = h
        .events
        .borrow()
        .notices
        .iter()
        .map(|n| n.body.clone())
        .collect();
    assert_eq!(bodies, vec!["Timer resumed", "Timer paused", "Timer reset"]);
}

#[test]
fn test_shortcuts_drive_window_state() {
    let mut h = harness(|_| {});
    assert!(h.core.handle_shortcut(ShortcutAction::LockUnlock));
    assert!(h.core.window().is_locked());
    assert!(!h.core.window().can_drag());

    assert!(h.core.handle_shortcut(ShortcutAction::ShowHide));
    assert!(!h.core.window().is_visible);

    assert!(h.core.handle_shortcut(ShortcutAction::PauseResume));
    assert!(h.core.is_running());

    assert!(!h.core.handle_shortcut(ShortcutAction::OpenSettings));

    let bodies: Vec<String> = h
        .events
        .borrow()
        .notices
        .iter()
        .map(|n| n.body.clone())
        .collect();
    assert_eq!(
        bodies,
        vec![
            "Window locked (click-through)",
            "Minimized to tray",
            "Timer resumed"
        ]
    );
}

#[test]
fn test_quit_sets_exit_flag_once() {
    let mut h = harness(|_| {});
    h.core.quit();
    assert!(h.core.window_mut().should_exit_and_clear());
    assert!(!h.core.window_mut().should_exit_and_clear());
}

#[test]
fn test_language_change_reaches_finished_event() {
    let mut h = harness(three_second_countdown);
    assert_eq!(h.core.language(), Language::EnUs);

    h.core.update_settings(h.at(0), |s| s.language = Language::ZhCn);
    assert!(h.core.is_running());
    for second in 1..=3 {
        h.core.poll(h.at(second * 1000));
    }

    let events = h.events.borrow();
    assert_eq!(events.finished.len(), 1);
    assert_eq!(events.finished[0].language, Language::ZhCn);
}
