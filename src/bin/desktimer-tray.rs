// DeskTimer Tray App - system tray front end for the overlay timer
// Shows the timer in the tray tooltip, with a menu and global hot-keys

use anyhow::{Context, Result};
use clap::Parser;
use desktimer::hotkeys::HotkeyManager;
use desktimer::i18n::Catalog;
use desktimer::notifications::DesktopNotifier;
use desktimer::settings::ModeKey;
use desktimer::settings_store::SettingsStore;
use desktimer::timer::format::SystemClock;
use desktimer::{config, DeskTimer, TrayStatus};
use global_hotkey::GlobalHotKeyEvent;
use log::{error, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tao::event::Event;
use tao::event_loop::{ControlFlow, EventLoopBuilder};
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use tray_icon::{TrayIcon, TrayIconBuilder};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const ICON_SIZE: u32 = 32;

/// Desktop timer in the system tray
#[derive(Parser, Debug)]
#[command(author, version, about = "Desktop timer in the system tray")]
struct Args {
    /// Base directory holding settings/ and lang/ (overrides DESKTIMER_HOME)
    #[arg(long, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Switch to this mode before starting (countup, countdown, clock)
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ModeKey>,

    /// Start counting immediately
    #[arg(long)]
    start: bool,
}

fn parse_mode(text: &str) -> Result<ModeKey, String> {
    ModeKey::parse(text).ok_or_else(|| format!("unknown mode '{}'", text))
}

/// Wakes the event loop from menu and hot-key callbacks
enum UserEvent {
    Menu(MenuEvent),
    HotKey(GlobalHotKeyEvent),
}

#[derive(Debug, Clone)]
enum MenuAction {
    PauseResume,
    Reset,
    Mode(ModeKey),
    Preset(String),
    LockUnlock,
    Fullscreen,
    ShowHide,
    Quit,
}

struct TrayMenu {
    menu: Menu,
    pause_item: MenuItem,
    lock_item: MenuItem,
    actions: HashMap<MenuId, MenuAction>,
}

impl TrayMenu {
    fn build(core: &DeskTimer) -> Result<Self> {
        let mut actions = HashMap::new();
        let mut item = |text: &str, action: MenuAction| {
            let item = MenuItem::new(text, true, None);
            actions.insert(item.id().clone(), action);
            item
        };

        let pause_item = item(core.translate("pause"), MenuAction::PauseResume);
        let reset_item = item(core.translate("reset"), MenuAction::Reset);
        let mode_items = [ModeKey::CountUp, ModeKey::Countdown, ModeKey::Clock]
            .map(|mode| item(core.translate(mode.label_key()), MenuAction::Mode(mode)));

        let language = core.language();
        let preset_items: Vec<MenuItem> = core
            .settings()
            .countdown_presets
            .iter()
            .map(|preset| {
                item(
                    &preset.display_label(core.catalog(), language),
                    MenuAction::Preset(preset.id.clone()),
                )
            })
            .collect();

        let lock_item = item(core.translate("lock_window"), MenuAction::LockUnlock);
        let fullscreen_item = item(core.translate("enter_fullscreen"), MenuAction::Fullscreen);
        let show_item = item(core.translate("show_hide"), MenuAction::ShowHide);
        let quit_item = item(core.translate("quit"), MenuAction::Quit);

        let presets = Submenu::new(core.translate("quick_presets"), true);
        for preset_item in &preset_items {
            presets.append(preset_item).context("Failed to add preset menu item")?;
        }

        let menu = Menu::new();
        menu.append(&pause_item).context("Failed to add pause menu item")?;
        menu.append(&reset_item).context("Failed to add reset menu item")?;
        menu.append(&PredefinedMenuItem::separator())
            .context("Failed to add separator")?;
        for mode_item in &mode_items {
            menu.append(mode_item).context("Failed to add mode menu item")?;
        }
        menu.append(&presets).context("Failed to add presets submenu")?;
        menu.append(&PredefinedMenuItem::separator())
            .context("Failed to add separator")?;
        menu.append(&lock_item).context("Failed to add lock menu item")?;
        menu.append(&fullscreen_item)
            .context("Failed to add fullscreen menu item")?;
        menu.append(&show_item).context("Failed to add show/hide menu item")?;
        menu.append(&PredefinedMenuItem::separator())
            .context("Failed to add separator")?;
        menu.append(&quit_item).context("Failed to add quit menu item")?;

        Ok(Self {
            menu,
            pause_item,
            lock_item,
            actions,
        })
    }

    /// Keep item labels in step with the timer and window state
    fn refresh(&self, core: &DeskTimer) {
        let pause_label = if core.is_running() { "pause" } else { "continue" };
        self.pause_item.set_text(core.translate(pause_label));
        let lock_label = if core.window().is_locked() {
            "unlock_window"
        } else {
            "lock_window"
        };
        self.lock_item.set_text(core.translate(lock_label));
    }
}

fn status_color(status: TrayStatus) -> [u8; 4] {
    match status {
        TrayStatus::Flashing => [255, 140, 0, 255],
        TrayStatus::Running => [0, 200, 83, 255],
        TrayStatus::Paused => [255, 193, 7, 255],
        TrayStatus::Stopped => [158, 158, 158, 255],
    }
}

/// Solid disc in the status colour
fn status_icon(status: TrayStatus) -> Result<tray_icon::Icon> {
    let color = status_color(status);
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 1.0;
    let mut rgba = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let (dx, dy) = (x as f32 - center, y as f32 - center);
            if dx * dx + dy * dy <= radius * radius {
                rgba.extend_from_slice(&color);
            } else {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }
    tray_icon::Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE).context("Failed to create tray icon")
}

fn update_tray(tray: &TrayIcon, core: &DeskTimer, last_status: &mut Option<TrayStatus>) {
    let tooltip = format!("{} - {}", core.translate("app_name"), core.display_text());
    if let Err(e) = tray.set_tooltip(Some(tooltip)) {
        warn!("Failed to update tray tooltip: {}", e);
    }

    let status = core.tray_status();
    if *last_status == Some(status) {
        return;
    }
    *last_status = Some(status);
    match status_icon(status) {
        Ok(icon) => {
            if let Err(e) = tray.set_icon(Some(icon)) {
                error!("Failed to update tray icon: {}", e);
            }
        }
        Err(e) => error!("{:#}", e),
    }
}

fn run_menu_action(core: &mut DeskTimer, action: MenuAction, now: Instant) {
    match action {
        MenuAction::PauseResume => {
            core.toggle_pause();
        }
        MenuAction::Reset => core.reset(),
        MenuAction::Mode(mode) => core.switch_mode(mode, now),
        MenuAction::Preset(id) => {
            core.apply_preset_by_id(&id, now);
        }
        MenuAction::LockUnlock => {
            core.toggle_lock();
        }
        MenuAction::Fullscreen => {
            core.toggle_fullscreen();
        }
        MenuAction::ShowHide => {
            core.toggle_visible();
        }
        MenuAction::Quit => core.quit(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    config::init_logging();

    info!("Starting DeskTimer Tray App v{}", VERSION);

    let base_dir = config::resolve_base_dir(args.home);
    let catalog = Arc::new(Catalog::load(&config::lang_dir(&base_dir)));
    let store = SettingsStore::open(SettingsStore::settings_path(&base_dir), &catalog);
    let mut core = DeskTimer::new(
        store,
        Arc::clone(&catalog),
        Box::new(SystemClock),
        Instant::now(),
    );
    if let Some(mode) = args.mode {
        core.switch_mode(mode, Instant::now());
    }
    if args.start {
        core.start();
    }
    core.subscribe(Box::new(DesktopNotifier::new(Arc::clone(&catalog), true)));

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();

    let proxy = Mutex::new(event_loop.create_proxy());
    MenuEvent::set_event_handler(Some(move |event| {
        if let Ok(proxy) = proxy.lock() {
            let _ = proxy.send_event(UserEvent::Menu(event));
        }
    }));
    let proxy = Mutex::new(event_loop.create_proxy());
    GlobalHotKeyEvent::set_event_handler(Some(move |event| {
        if let Ok(proxy) = proxy.lock() {
            let _ = proxy.send_event(UserEvent::HotKey(event));
        }
    }));

    // Hot-keys are optional: a desktop without a global shortcut service
    // still gets the tray menu
    let hotkeys = match HotkeyManager::new() {
        Ok(mut manager) => {
            let count = manager.register_shortcuts(&core.settings().shortcuts);
            info!("{} global hotkeys registered", count);
            Some(manager)
        }
        Err(e) => {
            warn!("Global hotkeys unavailable: {:#}", e);
            None
        }
    };

    let tray_menu = TrayMenu::build(&core)?;
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(tray_menu.menu.clone()))
        .with_tooltip(core.translate("app_name"))
        .with_icon(status_icon(core.tray_status())?)
        .build()
        .context("Failed to create tray icon")?;

    info!("Tray icon created, running event loop");

    let mut last_status = None;
    let mut hotkeys = hotkeys;
    event_loop.run(move |event, _, control_flow| {
        let now = Instant::now();
        match event {
            Event::UserEvent(UserEvent::Menu(event)) => {
                if let Some(action) = tray_menu.actions.get(&event.id).cloned() {
                    run_menu_action(&mut core, action, now);
                }
            }
            Event::UserEvent(UserEvent::HotKey(event)) => {
                if event.state == global_hotkey::HotKeyState::Pressed {
                    let action = hotkeys.as_ref().and_then(|m| m.action_for(event.id));
                    if let Some(action) = action {
                        if !core.handle_shortcut(action) {
                            info!("Settings dialog is not available in the tray app");
                        }
                    }
                }
            }
            _ => {}
        }

        core.poll(now);
        tray_menu.refresh(&core);
        update_tray(&tray, &core, &mut last_status);

        if core.window_mut().should_exit_and_clear() {
            info!("Quit menu item clicked, exiting");
            if let Some(manager) = hotkeys.as_mut() {
                if let Err(e) = manager.unregister_all() {
                    warn!("Failed to unregister hotkeys: {:#}", e);
                }
            }
            core.shutdown();
            *control_flow = ControlFlow::Exit;
        } else {
            *control_flow = ControlFlow::WaitUntil(core.next_wakeup());
        }
    });
}
