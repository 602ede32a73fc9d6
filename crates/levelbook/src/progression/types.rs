//! Data structures for owner profiles and progression outcomes.

use serde::{Deserialize, Serialize};

use crate::owner::OwnerId;
use crate::rulebook::Resolution;
use crate::time::now_micros;

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// An owner's materialized progression state.
///
/// `total_xp`, `level`, `rank`, and `title` are projections of the ledger
/// through the owner's rulebook, recomputed and persisted on every ledger
/// or rulebook mutation. Reads never derive them on the fly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub owner: OwnerId,
    pub display_name: String,
    /// Signed sum of all ledger amounts. Can go negative; resolution
    /// clamps at zero, the stored sum does not.
    pub total_xp: i64,
    pub level: u32,
    pub rank: String,
    pub title: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Profile {
    /// Create a fresh profile at zero XP with the given resolution.
    pub fn new(owner: OwnerId, display_name: impl Into<String>, resolution: Resolution) -> Self {
        let now = now_micros();
        Self {
            owner,
            display_name: display_name.into(),
            total_xp: 0,
            level: resolution.level,
            rank: resolution.rank,
            title: resolution.title,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the derived fields with a freshly resolved state.
    pub fn apply(&mut self, total_xp: i64, resolution: Resolution) {
        self.total_xp = total_xp;
        self.level = resolution.level;
        self.rank = resolution.rank;
        self.title = resolution.title;
        self.updated_at = now_micros();
    }
}

// ---------------------------------------------------------------------------
// Recompute outcome
// ---------------------------------------------------------------------------

/// Result of a profile recomputation.
///
/// Carries the persisted profile together with the level it replaced, so
/// callers can detect level transitions. The engine itself emits no
/// events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeOutcome {
    pub profile: Profile,
    pub previous_level: u32,
}

impl RecomputeOutcome {
    /// The recomputation raised the owner's level.
    pub fn leveled_up(&self) -> bool {
        self.profile.level > self.previous_level
    }

    /// The recomputation lowered the owner's level.
    pub fn leveled_down(&self) -> bool {
        self.profile.level < self.previous_level
    }
}
