//! Query engine for ledger entries.
//!
//! This module provides [`LedgerQuery`] and its execution function
//! [`query_entries`], which operate directly on the in-memory
//! [`crate::index::LedgerIndex`]: filter entries by category,
//! sub-category, source, and timestamp range, then sort and cap the
//! result set.
//!
//! ## Query execution model
//!
//! [`query_entries`]:
//! 1. Collects an initial candidate set from the most selective index hint
//!    available, or falls back to a full scan.
//! 2. Applies every specified filter in turn to narrow the set.
//! 3. Sorts the results according to [`SortOrder`].
//! 4. Applies an optional result limit.

use crate::habit::{CategoryId, SubCategoryId};
use crate::index::LedgerIndex;
use crate::ledger::{XpEntry, XpSource};

// ── SortOrder ─────────────────────────────────────────────────────────────────

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently recorded entry first (descending timestamp).
    #[default]
    NewestFirst,
    /// Oldest entry first (ascending timestamp).
    OldestFirst,
}

// ── LedgerQuery ───────────────────────────────────────────────────────────────

/// Query parameters for filtering and sorting [`XpEntry`] records.
///
/// All fields are optional.  Unset fields impose no restriction.
/// When multiple filters are set they are combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    /// Restrict results to entries filed under this category.
    pub category: Option<CategoryId>,
    /// Restrict results to entries filed under this sub-category.
    pub sub_category: Option<SubCategoryId>,
    /// Restrict results to entries with exactly this source.  Because
    /// [`XpSource::HabitCompletion`] carries the habit ID, this doubles
    /// as a per-habit filter.
    pub source: Option<XpSource>,
    /// Restrict results to entries whose timestamp falls within `[from, to]`.
    pub time_range: Option<(u64, u64)>,
    /// Maximum number of entries to return (applied after sorting).
    pub limit: Option<usize>,
    /// Sort order for the returned entries.
    pub sort: SortOrder,
}

// ── query_entries ─────────────────────────────────────────────────────────────

/// Execute a [`LedgerQuery`] against a [`LedgerIndex`].
///
/// Returns a `Vec` of references to matching entries sorted according to
/// `query.sort` and capped at `query.limit` entries.
pub fn query_entries<'a>(index: &'a LedgerIndex, query: &LedgerQuery) -> Vec<&'a XpEntry> {
    // ── Step 1: build the initial candidate set ───────────────────────────

    // Use the most selective single-key index available.
    // Priority: sub-category index > category index > time-range index > full scan.
    let mut candidates: Vec<&XpEntry> =
        match (&query.sub_category, &query.category, &query.time_range) {
            // Sub-category present — typically the smallest set.
            (Some(sub), _, _) => index.by_sub_category(sub),

            // No sub-category, but category present — start from category index.
            (None, Some(category), _) => index.by_category(category),

            // Neither grouping key, but time range present — use time index.
            (None, None, Some((from, to))) => index.by_time_range(*from, *to),

            // No hints at all — full scan over everything.
            (None, None, None) => {
                // Collect all entries from the time-ordered index for a
                // stable, reproducible ordering baseline.
                index.by_time_range(0, u64::MAX)
            }
        };

    // ── Step 2: apply remaining filters ──────────────────────────────────

    // Each filter is re-applied unconditionally even when it seeded the
    // candidate set; the re-check is idempotent and cheap.
    if let Some(sub) = &query.sub_category {
        candidates.retain(|e| e.sub_category.as_ref() == Some(sub));
    }

    if let Some(category) = &query.category {
        candidates.retain(|e| &e.category == category);
    }

    if let Some(source) = &query.source {
        candidates.retain(|e| &e.source == source);
    }

    if let Some((from, to)) = &query.time_range {
        candidates.retain(|e| e.recorded_at >= *from && e.recorded_at <= *to);
    }

    // ── Step 3: sort ─────────────────────────────────────────────────────

    match query.sort {
        SortOrder::NewestFirst => {
            candidates.sort_unstable_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        }
        SortOrder::OldestFirst => {
            candidates.sort_unstable_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        }
    }

    // ── Step 4: apply limit ───────────────────────────────────────────────

    if let Some(limit) = query.limit {
        candidates.truncate(limit);
    }

    candidates
}

// ── Tests ─────────────────────────────────────────────────────────────────────
