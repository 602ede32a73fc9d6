//! Data structures for radar aggregates.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::habit::{CategoryId, SubCategoryId};
use crate::time::{day_start_micros, DAY_MICROS};

// ---------------------------------------------------------------------------
// Radar range
// ---------------------------------------------------------------------------

/// Time window for radar aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadarRange {
    /// The 7 calendar days ending at the reference day, inclusive.
    Week,
    /// The 30 calendar days ending at the reference day, inclusive.
    Month,
    /// No window — every entry counts.
    All,
}

impl RadarRange {
    /// Microsecond bounds `[from, to]` of this range relative to `today`,
    /// or `None` for the unbounded range.
    ///
    /// `Week` as of day D covers D−6 through the last microsecond of D;
    /// `Month` covers D−29 through the same end.
    pub fn window(self, today: NaiveDate) -> Option<(u64, u64)> {
        let span_days = match self {
            RadarRange::Week => 6,
            RadarRange::Month => 29,
            RadarRange::All => return None,
        };
        let from = today
            .checked_sub_days(Days::new(span_days))
            .map(day_start_micros)
            .unwrap_or(0);
        let to = day_start_micros(today) + DAY_MICROS - 1;
        Some((from, to))
    }
}

impl std::fmt::Display for RadarRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RadarRange::Week => "week",
            RadarRange::Month => "month",
            RadarRange::All => "all",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Radar stats
// ---------------------------------------------------------------------------

/// Aggregated stats for one category. Derived on read, never persisted.
///
/// `level` is re-resolved from the windowed sum through the owner's
/// rulebook — a comparative per-category statistic, distinct from the
/// owner's global level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarStat {
    pub category: CategoryId,
    pub name: String,
    /// Sum of entry amounts inside the requested window. Can be negative.
    pub total_xp: i64,
    /// Level resolved from the windowed sum, clamped at 0 before resolving.
    pub level: u32,
    /// Current consecutive-day streak for this category.
    pub streak: u32,
    /// Sum over the trailing 7-day window, regardless of the requested range.
    pub last7_days_xp: i64,
    /// Sum over the trailing 30-day window, regardless of the requested range.
    pub last30_days_xp: i64,
    /// Number of active habits mapped to this category.
    pub habit_count: u32,
}

/// Aggregated all-time stats for one sub-category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategoryRadarStat {
    pub sub_category: SubCategoryId,
    pub name: String,
    pub total_xp: i64,
    pub level: u32,
    pub streak: u32,
    pub last7_days_xp: i64,
    pub last30_days_xp: i64,
    pub habit_count: u32,
}

/// One category's all-time rollup together with a row per sub-category.
///
/// Entries filed directly under the category (no sub-category) count in
/// the rollup but appear in no sub-category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWithSubRadar {
    pub category: RadarStat,
    pub sub_categories: Vec<SubCategoryRadarStat>,
}
