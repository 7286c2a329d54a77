//! Wall-clock helpers for focusguard
//!
//! Session start times, expiry and the daily statistics all work in local
//! wall-clock time.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `FOCUSGUARD_MOCK_TIME` environment variable overrides
//! the system time for everything that goes through [`now`]. The mocked clock
//! advances at the real rate from the given starting point.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 23:55:00`)

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "FOCUSGUARD_MOCK_TIME";

/// Format used for persisted calendar-day keys
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

fn parse_mock_time(value: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").ok()?;
    Local.from_local_datetime(&naive).single()
}

#[allow(clippy::disallowed_methods)] // wraps Local::now()
fn mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        if !cfg!(debug_assertions) {
            return None;
        }
        let value = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
        match parse_mock_time(&value) {
            Some(mock) => {
                let offset = mock.signed_duration_since(Local::now());
                tracing::info!(
                    mock_time = %value,
                    offset_secs = offset.num_seconds(),
                    "Mock time enabled"
                );
                Some(offset)
            }
            None => {
                tracing::warn!(
                    mock_time = %value,
                    expected_format = "%Y-%m-%d %H:%M:%S",
                    "Invalid mock time, using system clock"
                );
                None
            }
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    mock_time_offset().is_some()
}

/// Current local time, respecting mock time in debug builds.
#[allow(clippy::disallowed_methods)] // wraps Local::now()
pub fn now() -> DateTime<Local> {
    let real_now = Local::now();
    match mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Calendar day (user-local) of a timestamp
pub fn local_day(dt: &DateTime<Local>) -> NaiveDate {
    dt.date_naive()
}

/// Persisted form of a calendar day, e.g. `2025-03-14`
pub fn day_key(dt: &DateTime<Local>) -> String {
    local_day(dt).format(DAY_KEY_FORMAT).to_string()
}

/// Whole minutes elapsed between two instants, floored, never negative
pub fn whole_minutes_between(start: &DateTime<Local>, end: &DateTime<Local>) -> u32 {
    let millis = end.signed_duration_since(*start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    u32::try_from(millis / 60_000).unwrap_or(u32::MAX)
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Format a remaining-seconds countdown as `HH:MM:SS`
pub fn format_countdown(total_secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}
