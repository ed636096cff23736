//! Settings file persistence
//!
//! This module owns the single in-memory `Settings` document and its
//! on-disk JSON copy. Loading never fails: unreadable or corrupt files fall
//! back to defaults and are rewritten. Saving is either immediate or
//! debounced against an explicit deadline that the caller polls.

use crate::constants::{SETTINGS_DIR_NAME, SETTINGS_FILE_NAME, SETTINGS_SAVE_DELAY_MS};
use crate::i18n::Catalog;
use crate::settings::presets::normalize_presets;
use crate::settings::Settings;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
    dirty: bool,
    save_deadline: Option<Instant>,
    debounce: Duration,
    writes: u64,
}

impl SettingsStore {
    /// `<base>/settings/timer_settings.json`
    pub fn settings_path(base_dir: &Path) -> PathBuf {
        base_dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME)
    }

    /// Load the document at `path`, writing it back at once if it was upgraded
    pub fn open(path: PathBuf, catalog: &Catalog) -> Self {
        let (settings, changed) = Self::load_from_path(&path, catalog);
        let mut store = Self {
            path,
            settings,
            dirty: false,
            save_deadline: None,
            debounce: Duration::from_millis(SETTINGS_SAVE_DELAY_MS),
            writes: 0,
        };
        if changed {
            log::info!("Settings upgraded, saving {}", store.path.display());
            store.dirty = true;
            store.write_now();
        }
        store
    }

    /// Override the debounce window (defaults to one second)
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Read and normalize settings from `path`
    ///
    /// Returns the document and whether it differs from what was on disk.
    /// Missing, unreadable or unparsable files yield the defaults.
    pub fn load_from_path(path: &Path, catalog: &Catalog) -> (Settings, bool) {
        match Self::read_document(path) {
            Ok(Some(raw)) => {
                let (mut settings, mut changed) = Settings::from_value(&raw, catalog);
                if let Some(base_dir) = Self::base_dir(path) {
                    changed |= settings.relativize_sound_file(base_dir);
                }
                log::info!(
                    "Loaded settings from {} (upgraded: {})",
                    path.display(),
                    changed
                );
                (settings, changed)
            }
            Ok(None) => {
                log::info!(
                    "No settings file at {}, creating defaults",
                    path.display()
                );
                (Settings::default(), true)
            }
            Err(e) => {
                log::warn!("{:#}; falling back to default settings", e);
                (Settings::default(), true)
            }
        }
    }

    /// `<base>` for a document stored at `<base>/settings/timer_settings.json`
    fn base_dir(path: &Path) -> Option<&Path> {
        path.parent()?.parent()
    }

    fn read_document(path: &Path) -> Result<Option<Value>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let raw: Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        Ok(Some(raw))
    }

    fn write_document(path: &Path, settings: &Settings) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let mut contents = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut contents, formatter);
        settings
            .serialize(&mut serializer)
            .context("Failed to serialize settings")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
        Ok(())
    }

    fn write_now(&mut self) -> bool {
        self.save_deadline = None;
        if normalize_presets(&mut self.settings.countdown_presets) {
            log::debug!("Presets re-normalized before save");
        }
        match Self::write_document(&self.path, &self.settings) {
            Ok(()) => {
                self.dirty = false;
                self.writes += 1;
                log::debug!("Settings saved to {}", self.path.display());
                true
            }
            Err(e) => {
                log::error!("Settings save failed: {:#}", e);
                false
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access without scheduling a save
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Mutate the document, then save immediately or debounced
    pub fn update<F>(&mut self, immediate: bool, now: Instant, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        f(&mut self.settings);
        self.save(immediate, now);
    }

    /// Persist the document
    ///
    /// `immediate` cancels any pending debounce and writes synchronously.
    /// Otherwise the document is marked dirty and the single debounce
    /// deadline is (re)armed to `now + debounce`.
    pub fn save(&mut self, immediate: bool, now: Instant) {
        self.dirty = true;
        if immediate {
            self.write_now();
        } else {
            self.save_deadline = Some(now + self.debounce);
        }
    }

    /// Perform the debounced write if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.save_deadline {
            Some(deadline) if now >= deadline => self.write_now(),
            _ => false,
        }
    }

    /// Write now if anything is unsaved
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            self.save_deadline = None;
            return false;
        }
        self.write_now()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.save_deadline
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of successful writes since the store was opened
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}
