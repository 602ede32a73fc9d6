//! Level, rank, and title resolution — a pure function over (XP, config).

use crate::error::Result;

use super::formula::Formula;
use super::types::{parse_thresholds, RulebookConfig, RulebookMode};

/// The resolver's output. Never persisted on its own; the progression
/// service copies it into the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub level: u32,
    pub rank: String,
    pub title: String,
}

/// Resolve an XP total to level, rank, and title under the given config.
///
/// MANUAL mode reads `level_rank_map` keys as XP thresholds: the highest
/// threshold not exceeding `total_xp` wins, and the level is that entry's
/// 1-based position in numeric order. AUTO mode evaluates
/// `xp_level_formula` to the level, then reads the same map keys as level
/// thresholds for the rank. Below the lowest threshold the first entry
/// applies, so a profile always has a rank.
///
/// Deterministic: same inputs, same output, no hidden state.
///
/// # Errors
///
/// A malformed threshold map or formula surfaces as a rulebook error
/// naming the field; callers keep the previous valid config.
pub fn resolve(total_xp: u64, config: &RulebookConfig) -> Result<Resolution> {
    let thresholds = parse_thresholds(&config.level_rank_map)?;

    let (level, rank) = match config.mode {
        RulebookMode::Manual => {
            let position = match_position(&thresholds, total_xp);
            ((position + 1) as u32, thresholds[position].1.clone())
        }
        RulebookMode::Auto => {
            let formula = Formula::parse(&config.xp_level_formula)?;
            let level = formula.eval_level(total_xp)?;
            let position = match_position(&thresholds, u64::from(level));
            (level, thresholds[position].1.clone())
        }
    };

    let title = config.title_for(&rank);

    Ok(Resolution { level, rank, title })
}

/// Index of the highest threshold not exceeding `value`, or 0 when every
/// threshold is above it. `thresholds` is non-empty and ascending
/// (guaranteed by `parse_thresholds`).
fn match_position(thresholds: &[(u64, String)], value: u64) -> usize {
    thresholds
        .iter()
        .rposition(|(threshold, _)| *threshold <= value)
        .unwrap_or(0)
}
