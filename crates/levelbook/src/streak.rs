//! Consecutive-day streak calculation over ledger activity.
//!
//! A streak is the number of consecutive calendar days, ending at the most
//! recent active day, on which at least one qualifying entry was recorded.
//! The calculation is pure: callers build a set of distinct active days
//! (UTC) for whatever scope they care about — one habit, one sub-category,
//! one category — and pass the reference day explicitly.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::ledger::XpEntry;
use crate::time::micros_to_day;

/// Collect the distinct UTC calendar days on which any of `entries` was
/// recorded. Multiple entries on the same day collapse to one set element.
pub fn active_day_set<'a>(entries: impl IntoIterator<Item = &'a XpEntry>) -> BTreeSet<NaiveDate> {
    entries
        .into_iter()
        .map(|e| micros_to_day(e.recorded_at))
        .collect()
}

/// Compute the current streak as of `today`.
///
/// The run starts at `today` when `today` is active, otherwise at
/// `today - 1` when that day is active — an in-progress day with no
/// activity yet does not zero an established streak. When neither day is
/// active the streak is 0. From the start day the count walks backwards
/// one calendar day at a time until the first inactive day.
///
/// Days after `today` are never examined, so future-dated activity does
/// not contribute.
pub fn current_streak(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if active_days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if active_days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 1u32;
    let mut cursor = start;
    while let Some(prev) = cursor.pred_opt() {
        if !active_days.contains(&prev) {
            break;
        }
        streak += 1;
        cursor = prev;
    }
    streak
}

/// Convenience wrapper: build the day set from `entries` and compute the
/// streak as of `today` in one call.
pub fn streak_from_entries<'a>(
    entries: impl IntoIterator<Item = &'a XpEntry>,
    today: NaiveDate,
) -> u32 {
    current_streak(&active_day_set(entries), today)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
