//! Levelbook — Habit progression and aggregation engine.
//!
//! Turns an append-only XP ledger into a game-style profile: per-owner
//! levels, ranks, and titles resolved through a configurable rulebook,
//! with radar aggregates, streaks, and habit completions layered on top.

pub mod error;
pub mod habit;
pub mod index;
pub mod ledger;
pub mod owner;
pub mod progression;
pub mod query;
pub mod radar;
pub mod rulebook;
pub mod storage;
pub mod streak;
pub mod time;

// Re-export primary types
pub use error::{LevelbookError, Result};
pub use owner::OwnerId;
pub use progression::{Profile, ProgressionService, RecomputeOutcome};

// Re-export ledger types
pub use ledger::{EntryDraft, EntryId, EntryPatch, XpEntry, XpSource};

// Re-export catalog types
pub use habit::{
    Catalog, Category, CategoryId, Habit, HabitId, HabitKind, SubCategory, SubCategoryId,
};

// Re-export rulebook types
pub use rulebook::{Resolution, RulebookConfig, RulebookMode, RulebookPatch};

// Re-export aggregation types
pub use query::{LedgerQuery, SortOrder};
pub use radar::{CategoryWithSubRadar, RadarRange, RadarStat, SubCategoryRadarStat};
