//! Rulebook configuration — the user-editable progression rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LevelbookError, Result};
use crate::owner::OwnerId;

use super::formula::Formula;

/// Config field name reported when the threshold map is rejected.
pub const RANK_MAP_FIELD: &str = "level_rank_map";

/// Title used when a rank has no entry in `rank_titles`.
pub const DEFAULT_TITLE: &str = "Adventurer";

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// How levels are computed from XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RulebookMode {
    /// `xp_level_formula` computes the level; `level_rank_map` keys are
    /// level thresholds.
    Auto,
    /// `level_rank_map` keys are XP thresholds; the level is the matched
    /// entry's 1-based position.
    Manual,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// The per-owner progression ruleset. Exactly one live config per owner.
///
/// `level_rank_map` keys are decimal strings and must be strictly
/// increasing when parsed numerically; JSON string keys keep the data
/// shape round-trippable while the resolver always works on the parsed
/// numbers. `artifact_thresholds` and `stat_multipliers` are opaque to
/// the resolver and only round-trip through storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulebookConfig {
    pub owner: OwnerId,
    pub mode: RulebookMode,
    pub xp_level_formula: String,
    pub level_rank_map: BTreeMap<String, String>,
    pub rank_titles: BTreeMap<String, String>,
    pub artifact_thresholds: BTreeMap<String, serde_json::Value>,
    pub stat_multipliers: BTreeMap<String, serde_json::Value>,
    pub updated_at: u64,
}

impl RulebookConfig {
    /// The default ruleset created with a new owner and restored by reset.
    pub fn default_for(owner: OwnerId) -> Self {
        let level_rank_map: BTreeMap<String, String> = [
            ("1", "E"),
            ("10", "D"),
            ("20", "C"),
            ("35", "B"),
            ("50", "A"),
            ("70", "S"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let rank_titles: BTreeMap<String, String> = [
            ("E", "Novice"),
            ("D", "Apprentice"),
            ("C", "Adept"),
            ("B", "Veteran"),
            ("A", "Elite"),
            ("S", "Legend"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            owner,
            mode: RulebookMode::Auto,
            xp_level_formula: "floor(xp / 100) + 1".to_string(),
            level_rank_map,
            rank_titles,
            artifact_thresholds: BTreeMap::new(),
            stat_multipliers: BTreeMap::new(),
            updated_at: crate::time::now_micros(),
        }
    }

    /// Check the config is usable before it is saved.
    ///
    /// The formula is re-parsed from source and probe-evaluated at two XP
    /// values so a config that would fail on first resolve is rejected at
    /// save time instead. The threshold map must parse numerically with
    /// no duplicate values.
    ///
    /// # Errors
    ///
    /// Returns a rulebook error naming the offending field.
    pub fn validate(&self) -> Result<()> {
        parse_thresholds(&self.level_rank_map)?;

        let formula = Formula::parse(&self.xp_level_formula)?;
        if self.mode == RulebookMode::Auto {
            formula.eval_level(0)?;
            formula.eval_level(1000)?;
        }

        Ok(())
    }

    /// Apply a patch, producing the candidate config. The caller
    /// validates the candidate before persisting it.
    pub fn apply(&self, patch: RulebookPatch) -> Self {
        let mut next = self.clone();
        if let Some(mode) = patch.mode {
            next.mode = mode;
        }
        if let Some(formula) = patch.xp_level_formula {
            next.xp_level_formula = formula;
        }
        if let Some(map) = patch.level_rank_map {
            next.level_rank_map = map;
        }
        if let Some(titles) = patch.rank_titles {
            next.rank_titles = titles;
        }
        if let Some(thresholds) = patch.artifact_thresholds {
            next.artifact_thresholds = thresholds;
        }
        if let Some(multipliers) = patch.stat_multipliers {
            next.stat_multipliers = multipliers;
        }
        next.updated_at = crate::time::now_micros();
        next
    }

    /// Display title for a rank, falling back to [`DEFAULT_TITLE`].
    pub fn title_for(&self, rank: &str) -> String {
        self.rank_titles
            .get(rank)
            .cloned()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }
}

/// Parse the threshold map into `(threshold, rank)` pairs sorted by
/// ascending threshold.
///
/// # Errors
///
/// Rejects an empty map, non-numeric keys, and keys that collide when
/// parsed numerically (e.g. `"5"` and `"05"`).
pub fn parse_thresholds(map: &BTreeMap<String, String>) -> Result<Vec<(u64, String)>> {
    if map.is_empty() {
        return Err(LevelbookError::rulebook(
            RANK_MAP_FIELD,
            "must contain at least one threshold",
        ));
    }

    let mut thresholds = Vec::with_capacity(map.len());
    for (key, rank) in map {
        let value: u64 = key.trim().parse().map_err(|_| {
            LevelbookError::rulebook(
                RANK_MAP_FIELD,
                format!("key '{key}' is not a non-negative integer"),
            )
        })?;
        thresholds.push((value, rank.clone()));
    }

    thresholds.sort_by_key(|(value, _)| *value);
    for pair in thresholds.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(LevelbookError::rulebook(
                RANK_MAP_FIELD,
                format!("duplicate threshold {}", pair[0].0),
            ));
        }
    }

    Ok(thresholds)
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Field-by-field update for a rulebook config. Absent fields keep their
/// current values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulebookPatch {
    pub mode: Option<RulebookMode>,
    pub xp_level_formula: Option<String>,
    pub level_rank_map: Option<BTreeMap<String, String>>,
    pub rank_titles: Option<BTreeMap<String, String>>,
    pub artifact_thresholds: Option<BTreeMap<String, serde_json::Value>>,
    pub stat_multipliers: Option<BTreeMap<String, serde_json::Value>>,
}
