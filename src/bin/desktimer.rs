// DeskTimer CLI - terminal front end for the overlay timer
// Renders the timer text in place and reads single-line commands from stdin

use anyhow::{Context, Result};
use clap::Parser;
use desktimer::i18n::Catalog;
use desktimer::notifications::DesktopNotifier;
use desktimer::settings::ModeKey;
use desktimer::settings_store::SettingsStore;
use desktimer::timer::format::SystemClock;
use desktimer::{config, CountdownFinished, DeskTimer, Notice, TimerListener};
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Desktop timer: count up, count down, or show the clock
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Desktop timer: count up, count down, or show the clock",
    long_about = "Desktop timer: count up, count down, or show the clock.

Settings are read from <HOME>/settings/timer_settings.json and shared with the
tray app. HOME defaults to the executable's directory.

COMMANDS (type and press Enter while running):
  p              Pause / resume
  r              Reset
  m <MODE>       Switch mode (countup, countdown, clock)
  c <H> <M> <S>  Start a custom countdown
  s <ID>         Apply a countdown preset
  q              Quit"
)]
struct Args {
    /// Base directory holding settings/ and lang/ (overrides DESKTIMER_HOME)
    #[arg(long, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Switch to this mode before starting (countup, countdown, clock)
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ModeKey>,

    /// Apply the countdown preset with this id
    #[arg(long, value_name = "ID")]
    preset: Option<String>,

    /// Start counting immediately
    #[arg(long)]
    start: bool,

    /// Print the configured countdown presets and exit
    #[arg(long)]
    list_presets: bool,
}

fn parse_mode(text: &str) -> Result<ModeKey, String> {
    ModeKey::parse(text).ok_or_else(|| format!("unknown mode '{}'", text))
}

/// Prints the timer in place on one terminal line
struct TerminalDisplay {
    catalog: Arc<Catalog>,
}

impl TimerListener for TerminalDisplay {
    fn on_tick(&mut self, display: &str) {
        print!("\r{:<32}", display);
        let _ = io::stdout().flush();
    }

    fn on_countdown_finished(&mut self, event: &CountdownFinished) {
        if event.play_sound {
            // Terminal bell stands in for the alarm sound
            print!("\x07");
        }
        println!(
            "\n{}",
            self.catalog.translate(event.language, "countdown_finished_msg")
        );
    }

    fn on_notice(&mut self, notice: &Notice) {
        info!("{}: {}", notice.title, notice.body);
    }
}

enum Command {
    Pause,
    Reset,
    Mode(ModeKey),
    Custom(String, String, String),
    Preset(String),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let command = match parts.next()? {
        "p" => Command::Pause,
        "r" => Command::Reset,
        "m" => Command::Mode(ModeKey::parse(parts.next()?)?),
        "c" => Command::Custom(
            parts.next().unwrap_or_default().to_string(),
            parts.next().unwrap_or_default().to_string(),
            parts.next().unwrap_or_default().to_string(),
        ),
        "s" => Command::Preset(parts.next()?.to_string()),
        "q" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn run_command(core: &mut DeskTimer, command: Command, now: Instant) {
    match command {
        Command::Pause => {
            core.toggle_pause();
        }
        Command::Reset => core.reset(),
        Command::Mode(mode) => core.switch_mode(mode, now),
        Command::Custom(h, m, s) => {
            if let Err(e) = core.start_custom_countdown(&h, &m, &s, now) {
                warn!("{}", e);
            } else {
                core.start();
            }
        }
        Command::Preset(id) => {
            if core.apply_preset_by_id(&id, now) {
                core.start();
            }
        }
        Command::Quit => core.quit(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    config::init_logging();

    let base_dir = config::resolve_base_dir(args.home);
    info!("Starting DeskTimer v{} (base: {})", env!("CARGO_PKG_VERSION"), base_dir.display());

    let catalog = Arc::new(Catalog::load(&config::lang_dir(&base_dir)));
    let store = SettingsStore::open(SettingsStore::settings_path(&base_dir), &catalog);
    let mut core = DeskTimer::new(
        store,
        Arc::clone(&catalog),
        Box::new(SystemClock),
        Instant::now(),
    );

    if args.list_presets {
        let language = core.language();
        for preset in &core.settings().countdown_presets {
            println!(
                "{:<24} {:02}:{:02}:{:02}  {}",
                preset.id,
                preset.hours,
                preset.minutes,
                preset.seconds,
                preset.display_label(&catalog, language)
            );
        }
        return Ok(());
    }

    let now = Instant::now();
    if let Some(mode) = args.mode {
        core.switch_mode(mode, now);
    }
    if let Some(id) = args.preset.as_deref() {
        if !core.apply_preset_by_id(id, now) {
            core.shutdown();
            anyhow::bail!("Unknown preset id '{}' (see --list-presets)", id);
        }
    }
    if args.start {
        core.start();
    }

    core.subscribe(Box::new(TerminalDisplay {
        catalog: Arc::clone(&catalog),
    }));
    core.subscribe(Box::new(DesktopNotifier::new(Arc::clone(&catalog), false)));

    let commands = spawn_stdin_reader();
    print!("\r{:<32}", core.display_text());
    io::stdout().flush().context("Failed to write to terminal")?;

    loop {
        let now = Instant::now();
        core.poll(now);
        if core.window_mut().should_exit_and_clear() {
            break;
        }

        let timeout = core.next_wakeup().saturating_duration_since(Instant::now());
        match commands.recv_timeout(timeout) {
            Ok(line) => match parse_command(&line) {
                Some(command) => run_command(&mut core, command, Instant::now()),
                None => warn!("Unknown command: {}", line.trim()),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // stdin closed; keep ticking without commands
                thread::sleep(timeout);
            }
        }
    }

    println!();
    core.shutdown();
    info!("DeskTimer shutdown complete");
    Ok(())
}
