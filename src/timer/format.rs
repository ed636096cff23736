//! Display text for the counter and the wall clock

use crate::settings::{AmPmPosition, AmPmStyle};
use chrono::{Local, NaiveDateTime, Timelike};

/// `HH:MM:SS`, hours zero-padded to two digits but unbounded
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Clock-mode display options, taken from the `clock_*` settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockFormat {
    pub use_24h: bool,
    pub show_seconds: bool,
    pub show_date: bool,
    /// Only meaningful in 12-hour mode
    pub show_am_pm: bool,
    pub am_pm_style: AmPmStyle,
    pub am_pm_position: AmPmPosition,
}

impl Default for ClockFormat {
    fn default() -> Self {
        Self {
            use_24h: true,
            show_seconds: true,
            show_date: false,
            show_am_pm: true,
            am_pm_style: AmPmStyle::Zh,
            am_pm_position: AmPmPosition::Before,
        }
    }
}

fn am_pm_indicator(hour: u32, style: AmPmStyle) -> &'static str {
    let is_pm = hour >= 12;
    match (style, is_pm) {
        (AmPmStyle::En, false) => "AM",
        (AmPmStyle::En, true) => "PM",
        (AmPmStyle::Zh, false) => "上午",
        (AmPmStyle::Zh, true) => "下午",
    }
}

/// Render a wall-clock value
///
/// The AM/PM indicator always sits next to the time, so with the date shown
/// it reads `2024-05-01 下午 03:04:05`, never `下午 2024-05-01 ...`.
pub fn format_clock(now: &NaiveDateTime, format: &ClockFormat) -> String {
    let pattern = match (format.use_24h, format.show_seconds) {
        (true, true) => "%H:%M:%S",
        (true, false) => "%H:%M",
        (false, true) => "%I:%M:%S",
        (false, false) => "%I:%M",
    };
    let mut time = now.format(pattern).to_string();

    if !format.use_24h && format.show_am_pm {
        let indicator = am_pm_indicator(now.hour(), format.am_pm_style);
        time = match format.am_pm_position {
            AmPmPosition::Before => format!("{} {}", indicator, time),
            AmPmPosition::After => format!("{} {}", time, indicator),
        };
    }

    if format.show_date {
        format!("{} {}", now.format("%Y-%m-%d"), time)
    } else {
        time
    }
}

/// Source of the current wall-clock time
pub trait WallClock {
    fn now(&self) -> NaiveDateTime;
}

/// Local time from the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl WallClock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
