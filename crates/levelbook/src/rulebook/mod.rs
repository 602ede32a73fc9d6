//! Rulebook — user-editable rules mapping XP totals to level, rank, title.
//!
//! The rulebook module provides:
//! - The per-owner `RulebookConfig` with AUTO and MANUAL modes
//! - A restricted formula grammar for AUTO mode (data, never code)
//! - The pure resolver from an XP total to level/rank/title
//! - Save-time validation so a broken config never replaces a working one

pub mod formula;
pub mod resolver;
pub mod types;

pub use formula::{Formula, FORMULA_FIELD};
pub use resolver::{resolve, Resolution};
pub use types::{
    parse_thresholds, RulebookConfig, RulebookMode, RulebookPatch, DEFAULT_TITLE, RANK_MAP_FIELD,
};
