//! Time utilities for Levelbook.
//!
//! All timestamps are Unix epoch microseconds (u64). Streaks and radar
//! windows operate on UTC calendar days; the helpers here are the single
//! place where instants turn into days.

use chrono::NaiveDate;

/// Microseconds in one calendar day.
pub const DAY_MICROS: u64 = 86_400 * 1_000_000;

/// Return the current time as microseconds since Unix epoch.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_micros() as u64
}

/// Convert microseconds to an RFC 3339 string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    let dt = chrono::DateTime::from_timestamp(secs, nsecs).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}

/// UTC calendar day containing the given instant.
pub fn micros_to_day(micros: u64) -> NaiveDate {
    let secs = (micros / 1_000_000) as i64;
    let dt = chrono::DateTime::from_timestamp(secs, 0).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.date_naive()
}

/// First microsecond of the given UTC calendar day.
pub fn day_start_micros(day: NaiveDate) -> u64 {
    let secs = day
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0);
    secs.max(0) as u64 * 1_000_000
}

/// Current UTC calendar day.
pub fn today_utc() -> NaiveDate {
    micros_to_day(now_micros())
}
