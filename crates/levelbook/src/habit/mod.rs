//! Habit catalog — habits and the grouping keys they award XP under.
//!
//! The habit module provides:
//! - Categories and sub-categories, the aggregation grouping keys
//! - Habit definitions (binary or counter) with their XP rewards
//! - The per-owner catalog document with uniqueness and referential checks

pub mod types;

pub use types::{
    Catalog, Category, CategoryId, Habit, HabitId, HabitKind, SubCategory, SubCategoryId,
};
