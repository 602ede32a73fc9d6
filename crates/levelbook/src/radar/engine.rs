//! Radar aggregation — per-category and per-sub-category stats from the
//! ledger, the catalog, and the owner's rulebook.
//!
//! Everything here is a pure read: the caller supplies the hydrated
//! [`LedgerIndex`], the [`Catalog`], the active [`RulebookConfig`], and
//! the reference day. Nothing is written.

use chrono::NaiveDate;

use crate::error::Result;
use crate::habit::Catalog;
use crate::index::LedgerIndex;
use crate::ledger::XpEntry;
use crate::rulebook::{resolve, RulebookConfig};
use crate::streak::streak_from_entries;

use super::types::{CategoryWithSubRadar, RadarRange, RadarStat, SubCategoryRadarStat};

// ---------------------------------------------------------------------------
// Per-category radar
// ---------------------------------------------------------------------------

/// Compute one [`RadarStat`] per catalog category for the given range.
///
/// Every category in the catalog gets a row, including categories with no
/// entries in the window (all-zero stats). Rows come back in catalog
/// order.
///
/// # Errors
///
/// Returns a `Rulebook` error when the owner's config cannot resolve the
/// windowed sums.
pub fn radar_stats(
    index: &LedgerIndex,
    catalog: &Catalog,
    config: &RulebookConfig,
    range: RadarRange,
    today: NaiveDate,
) -> Result<Vec<RadarStat>> {
    catalog
        .categories
        .iter()
        .map(|cat| {
            let entries = index.by_category(&cat.id);
            let totals = scoped_totals(&entries, config, range, today)?;
            Ok(RadarStat {
                category: cat.id.clone(),
                name: cat.name.clone(),
                total_xp: totals.total_xp,
                level: totals.level,
                streak: totals.streak,
                last7_days_xp: totals.last7,
                last30_days_xp: totals.last30,
                habit_count: catalog.active_habit_count(&cat.id),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sub-category radar
// ---------------------------------------------------------------------------

/// Compute the all-time sub-category breakdown, grouped by category.
///
/// Each group carries the category's own all-time rollup plus one row per
/// sub-category, zero-activity rows included. Entries filed directly
/// under a category (no sub-category) count in the rollup only.
///
/// # Errors
///
/// Returns a `Rulebook` error when the owner's config cannot resolve the
/// summed totals.
pub fn sub_category_radar(
    index: &LedgerIndex,
    catalog: &Catalog,
    config: &RulebookConfig,
    today: NaiveDate,
) -> Result<Vec<CategoryWithSubRadar>> {
    let mut groups = Vec::with_capacity(catalog.categories.len());

    for cat in &catalog.categories {
        let entries = index.by_category(&cat.id);
        let totals = scoped_totals(&entries, config, RadarRange::All, today)?;
        let rollup = RadarStat {
            category: cat.id.clone(),
            name: cat.name.clone(),
            total_xp: totals.total_xp,
            level: totals.level,
            streak: totals.streak,
            last7_days_xp: totals.last7,
            last30_days_xp: totals.last30,
            habit_count: catalog.active_habit_count(&cat.id),
        };

        let mut sub_stats = Vec::new();
        for sub in catalog.sub_categories_of(&cat.id) {
            let sub_entries = index.by_sub_category(&sub.id);
            let totals = scoped_totals(&sub_entries, config, RadarRange::All, today)?;
            sub_stats.push(SubCategoryRadarStat {
                sub_category: sub.id.clone(),
                name: sub.name.clone(),
                total_xp: totals.total_xp,
                level: totals.level,
                streak: totals.streak,
                last7_days_xp: totals.last7,
                last30_days_xp: totals.last30,
                habit_count: catalog.active_habit_count_sub(&sub.id),
            });
        }

        groups.push(CategoryWithSubRadar {
            category: rollup,
            sub_categories: sub_stats,
        });
    }

    Ok(groups)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct ScopedTotals {
    total_xp: i64,
    level: u32,
    streak: u32,
    last7: i64,
    last30: i64,
}

/// Aggregate one scope's entries: windowed sum, window-scoped level,
/// streak, and the fixed trailing windows.
fn scoped_totals(
    entries: &[&XpEntry],
    config: &RulebookConfig,
    range: RadarRange,
    today: NaiveDate,
) -> Result<ScopedTotals> {
    let total_xp = windowed_sum(entries, range.window(today));
    // Negative sums resolve as zero XP; the reported total keeps its sign.
    let resolution = resolve(total_xp.max(0) as u64, config)?;

    Ok(ScopedTotals {
        total_xp,
        level: resolution.level,
        streak: streak_from_entries(entries.iter().copied(), today),
        last7: windowed_sum(entries, RadarRange::Week.window(today)),
        last30: windowed_sum(entries, RadarRange::Month.window(today)),
    })
}

fn windowed_sum(entries: &[&XpEntry], window: Option<(u64, u64)>) -> i64 {
    match window {
        Some((from, to)) => entries
            .iter()
            .filter(|e| e.recorded_at >= from && e.recorded_at <= to)
            .map(|e| e.amount)
            .sum(),
        None => entries.iter().map(|e| e.amount).sum(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
