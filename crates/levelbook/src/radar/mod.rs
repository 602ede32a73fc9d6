//! Radar aggregation — windowed per-category and per-sub-category stats.
//!
//! The radar module provides:
//! - Per-category stats for a week, month, or all-time window
//! - Window-scoped level resolution through the owner's rulebook
//! - Fixed trailing 7-day and 30-day sums on every row
//! - All-time sub-category breakdowns with category rollups
//! - Per-scope consecutive-day streaks

pub mod engine;
pub mod types;

pub use types::{CategoryWithSubRadar, RadarRange, RadarStat, SubCategoryRadarStat};

pub use engine::{radar_stats, sub_category_radar};
