//! XP ledger entries — the append-only-ish record of every XP award.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::habit::{CategoryId, HabitId, SubCategoryId};
use crate::owner::OwnerId;

/// Unique identifier for a ledger entry.
///
/// Format: `xp_` + base58 of first 16 bytes of SHA-256 over the owner,
/// category, instant, and a process-local sequence (so same-microsecond
/// bursts still get distinct IDs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

static ENTRY_SEQ: AtomicU64 = AtomicU64::new(0);

fn derive_entry_id(owner: &OwnerId, category: &CategoryId, recorded_at: u64) -> EntryId {
    let seq = ENTRY_SEQ.fetch_add(1, Ordering::Relaxed);
    let input = format!("{}:{}:{recorded_at}:{seq}", owner.0, category.0);
    let hash = Sha256::digest(input.as_bytes());
    let encoded = bs58::encode(&hash[..16]).into_string();
    EntryId(format!("xp_{encoded}"))
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Where an XP entry came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum XpSource {
    /// Awarded by completing a habit.
    HabitCompletion { habit: HabitId },
    /// Logged directly by the user.
    Manual,
}

impl XpSource {
    /// Return a stable string tag for filters and display.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::HabitCompletion { .. } => "habit_completion",
            Self::Manual => "manual",
        }
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One XP award (or deduction — the amount is signed, and zero is kept
/// as an audit no-op).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpEntry {
    pub id: EntryId,
    pub owner: OwnerId,
    pub category: CategoryId,
    pub sub_category: Option<SubCategoryId>,
    pub amount: i64,
    pub source: XpSource,
    pub recorded_at: u64,
    pub note: Option<String>,
}

impl XpEntry {
    /// Apply a patch, producing the updated entry. Identity fields
    /// (id, owner, source) never change.
    pub fn apply(&self, patch: EntryPatch) -> Self {
        let mut next = self.clone();
        if let Some(category) = patch.category {
            next.category = category;
        }
        if patch.clear_sub_category {
            next.sub_category = None;
        } else if let Some(sub) = patch.sub_category {
            next.sub_category = Some(sub);
        }
        if let Some(amount) = patch.amount {
            next.amount = amount;
        }
        if patch.clear_note {
            next.note = None;
        } else if let Some(note) = patch.note {
            next.note = Some(note);
        }
        if let Some(recorded_at) = patch.recorded_at {
            next.recorded_at = recorded_at;
        }
        next
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// An entry not yet committed to the ledger: everything but the identity
/// fields the service assigns on append.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    category: CategoryId,
    sub_category: Option<SubCategoryId>,
    amount: i64,
    source: XpSource,
    recorded_at: Option<u64>,
    note: Option<String>,
}

impl EntryDraft {
    /// Start a draft for a manual XP log.
    pub fn new(category: CategoryId, amount: i64) -> Self {
        Self {
            category,
            sub_category: None,
            amount,
            source: XpSource::Manual,
            recorded_at: None,
            note: None,
        }
    }

    /// File the entry under a sub-category.
    pub fn sub_category(mut self, sub: SubCategoryId) -> Self {
        self.sub_category = Some(sub);
        self
    }

    /// Mark the entry as produced by a habit completion.
    pub fn source(mut self, source: XpSource) -> Self {
        self.source = source;
        self
    }

    /// Backdate or pin the entry to a specific instant (default: now).
    pub fn recorded_at(mut self, micros: u64) -> Self {
        self.recorded_at = Some(micros);
        self
    }

    /// Attach a free-form note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub(crate) fn grouping(&self) -> (&CategoryId, Option<&SubCategoryId>) {
        (&self.category, self.sub_category.as_ref())
    }

    /// Finalize into a ledger entry for an owner, assigning the ID and
    /// the timestamp.
    pub fn into_entry(self, owner: &OwnerId) -> XpEntry {
        let recorded_at = self.recorded_at.unwrap_or_else(crate::time::now_micros);
        let id = derive_entry_id(owner, &self.category, recorded_at);
        XpEntry {
            id,
            owner: owner.clone(),
            category: self.category,
            sub_category: self.sub_category,
            amount: self.amount,
            source: self.source,
            recorded_at,
            note: self.note,
        }
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Field-by-field update for a ledger entry. Absent fields keep their
/// current values; the clear flags reset the optional fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub sub_category: Option<SubCategoryId>,
    #[serde(default)]
    pub clear_sub_category: bool,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub clear_note: bool,
    #[serde(default)]
    pub recorded_at: Option<u64>,
}
