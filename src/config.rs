//! Environment configuration for DeskTimer
//!
//! The persistent settings live in `timer_settings.json` (see the
//! settings_store module). Environment variables only decide where that
//! file lives and how verbose logging is.
//!
//! Environment variables (all optional):
//! - DESKTIMER_HOME: Base directory holding `settings/` and `lang/`
//! - DESKTIMER_DEBUG: Set to 1 to enable debug logging

use crate::constants::{APP_DIR_NAME, LANG_DIR_NAME};
use log::{debug, info, warn};
use std::env;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "DESKTIMER_HOME";
pub const DEBUG_ENV: &str = "DESKTIMER_DEBUG";

/// Parse the DESKTIMER_HOME environment variable
///
/// Returns Some(path) if set to a non-blank value
pub fn parse_home_override() -> Option<PathBuf> {
    match env::var(HOME_ENV) {
        Ok(val) if val.trim().is_empty() => {
            warn!("{} is set but empty. Ignoring.", HOME_ENV);
            None
        }
        Ok(val) => {
            info!("Base directory set via environment variable: {}", val);
            Some(PathBuf::from(val.trim()))
        }
        Err(_) => {
            debug!("{} not set.", HOME_ENV);
            None
        }
    }
}

/// Parse the DESKTIMER_DEBUG environment variable
///
/// Accepts `1`, `true`, `yes` and `on` (case-insensitive)
pub fn debug_logging_enabled() -> bool {
    match env::var(DEBUG_ENV) {
        Ok(val) => matches!(
            val.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

/// Initialize env_logger at Info, or Debug when DESKTIMER_DEBUG is enabled
pub fn init_logging() {
    let level = if debug_logging_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn executable_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Resolve the base directory
///
/// Precedence: `--home` flag > DESKTIMER_HOME > executable directory >
/// platform config directory.
pub fn resolve_base_dir(cli_override: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = cli_override {
        info!("Base directory set via --home argument: {}", dir.display());
        return dir;
    }
    if let Some(dir) = parse_home_override() {
        return dir;
    }
    if let Some(dir) = executable_dir() {
        return dir;
    }
    let fallback = dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."));
    warn!(
        "Could not determine executable directory, using {}",
        fallback.display()
    );
    fallback
}

/// `<base>/lang`
pub fn lang_dir(base_dir: &Path) -> PathBuf {
    base_dir.join(LANG_DIR_NAME)
}
