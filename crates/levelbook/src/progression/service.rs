//! The progression service — every ledger, rulebook, catalog, and
//! profile operation goes through here.
//!
//! The service owns the four stores and keeps one in-memory
//! [`LedgerIndex`] per owner, hydrated lazily from disk. Each owner has
//! a dedicated mutex; an operation takes it for its whole read-modify-
//! write span, so two racing mutations for the same owner serialize and
//! different owners never contend.
//!
//! Every ledger or rulebook mutation ends by recomputing the owner's
//! profile from the full ledger sum and persisting it before returning.
//! The profile on disk therefore always reflects the committed ledger
//! and the active rulebook.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{LevelbookError, Result};
use crate::habit::{
    Catalog, Category, CategoryId, Habit, HabitId, HabitKind, SubCategory, SubCategoryId,
};
use crate::index::LedgerIndex;
use crate::ledger::{EntryDraft, EntryId, EntryPatch, XpEntry, XpSource};
use crate::owner::OwnerId;
use crate::query::{query_entries, LedgerQuery, SortOrder};
use crate::radar::{CategoryWithSubRadar, RadarRange, RadarStat};
use crate::rulebook::{resolve, RulebookConfig, RulebookPatch};
use crate::storage::{CatalogStore, EntryStore, ProfileStore, RulebookStore};
use crate::streak::streak_from_entries;
use crate::time::today_utc;

use super::types::{Profile, RecomputeOutcome};

// ── Owner cell ────────────────────────────────────────────────────────────────

/// Per-owner mutable state behind the owner's mutex.
#[derive(Default)]
struct OwnerCell {
    /// Hydrated ledger index, or `None` before first access.
    index: Option<LedgerIndex>,
}

/// Lock an owner cell, recovering from poisoning.
///
/// A panicked writer may have left the hydrated index out of step with
/// disk, so recovery drops the index and forces a re-read.
fn lock_cell(cell: &Arc<Mutex<OwnerCell>>) -> MutexGuard<'_, OwnerCell> {
    match cell.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            let mut guard = poisoned.into_inner();
            guard.index = None;
            log::warn!("recovered a poisoned owner lock; ledger index dropped");
            guard
        }
    }
}

// ── ProgressionService ────────────────────────────────────────────────────────

/// Orchestrates profiles, rulebooks, catalogs, and the XP ledger for any
/// number of owners under one storage root.
///
/// The service is `Send + Sync`; share it behind an `Arc` to use it from
/// multiple threads. Operations for the same owner serialize on that
/// owner's mutex.
pub struct ProgressionService {
    profiles: ProfileStore,
    rulebooks: RulebookStore,
    catalogs: CatalogStore,
    entries: EntryStore,
    cells: Mutex<HashMap<OwnerId, Arc<Mutex<OwnerCell>>>>,
}

impl ProgressionService {
    /// Create a service rooted at `base_dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base = base_dir.into();
        Ok(Self {
            profiles: ProfileStore::new(&base)?,
            rulebooks: RulebookStore::new(&base)?,
            catalogs: CatalogStore::new(&base)?,
            entries: EntryStore::new(&base)?,
            cells: Mutex::new(HashMap::new()),
        })
    }

    // ── Owner lifecycle ───────────────────────────────────────────────────────

    /// Create a new owner: a profile at zero XP, the default rulebook,
    /// and an empty catalog.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty display name; storage errors otherwise.
    pub fn create_owner(&self, display_name: &str) -> Result<Profile> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(LevelbookError::Validation(
                "display name must not be empty".into(),
            ));
        }

        let owner = OwnerId::derive(display_name);
        let config = RulebookConfig::default_for(owner.clone());
        let profile = Profile::new(owner.clone(), display_name, resolve(0, &config)?);

        self.rulebooks.save(&config)?;
        self.catalogs.save(&Catalog::new(owner.clone()))?;
        self.profiles.save(&profile)?;

        log::info!("created owner {owner} ({display_name})");
        Ok(profile)
    }

    /// Load an owner's profile as last persisted.
    ///
    /// Serialized with mutations through the owner's cell lock, so a read
    /// never observes a half-written document.
    pub fn profile(&self, owner: &OwnerId) -> Result<Profile> {
        let cell = self.owner_cell(owner);
        let _guard = lock_cell(&cell);
        self.profiles.load(owner)
    }

    /// List every owner known to the storage root.
    pub fn list_owners(&self) -> Result<Vec<OwnerId>> {
        self.profiles.list_owners()
    }

    /// Re-derive an owner's profile from the ledger and the active
    /// rulebook, persist it, and report the level transition.
    pub fn recompute(&self, owner: &OwnerId) -> Result<RecomputeOutcome> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);
        self.recompute_locked(&mut guard, owner)
    }

    /// Reset an owner's profile by recomputing it, optionally wiping the
    /// ledger first.
    ///
    /// With `clear_ledger` false this is a forced recompute; with it
    /// true the ledger is emptied and the profile lands back at zero XP.
    pub fn reset_profile(&self, owner: &OwnerId, clear_ledger: bool) -> Result<RecomputeOutcome> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);
        if !self.profiles.exists(owner) {
            return Err(LevelbookError::NotFound(format!("owner not found: {owner}")));
        }
        if clear_ledger {
            self.clear_ledger_locked(&mut guard, owner)?;
        }
        self.recompute_locked(&mut guard, owner)
    }

    // ── Ledger mutations ──────────────────────────────────────────────────────

    /// Append a manual XP entry and recompute the profile.
    ///
    /// The draft's grouping keys must exist in the owner's catalog. The
    /// amount may be zero or negative; a missing timestamp defaults to
    /// now.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown grouping keys or owner, `Validation` for a
    /// sub-category outside its category.
    pub fn append_xp(&self, owner: &OwnerId, draft: EntryDraft) -> Result<RecomputeOutcome> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);

        let catalog = self.catalogs.load(owner)?;
        {
            let (category, sub_category) = draft.grouping();
            catalog.check_grouping(category, sub_category)?;
        }

        let entry = draft.into_entry(owner);
        self.entries.save(&entry)?;
        self.hydrated(&mut guard, owner)?.insert(entry);
        self.recompute_locked(&mut guard, owner)
    }

    /// Patch an existing entry and recompute the profile.
    ///
    /// Identity fields (`id`, `owner`, `source`) never change; grouping
    /// changes are validated against the catalog.
    pub fn update_xp(
        &self,
        owner: &OwnerId,
        id: &EntryId,
        patch: EntryPatch,
    ) -> Result<RecomputeOutcome> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);

        let existing = self
            .hydrated(&mut guard, owner)?
            .get(id)
            .cloned()
            .ok_or_else(|| LevelbookError::NotFound(format!("entry not found: {id}")))?;
        let updated = existing.apply(patch);

        let catalog = self.catalogs.load(owner)?;
        catalog.check_grouping(&updated.category, updated.sub_category.as_ref())?;

        self.entries.save(&updated)?;
        self.hydrated(&mut guard, owner)?.insert(updated);
        self.recompute_locked(&mut guard, owner)
    }

    /// Delete an entry and recompute the profile.
    pub fn delete_xp(&self, owner: &OwnerId, id: &EntryId) -> Result<RecomputeOutcome> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);

        if self.hydrated(&mut guard, owner)?.remove(id).is_none() {
            return Err(LevelbookError::NotFound(format!("entry not found: {id}")));
        }
        self.entries.delete(owner, id)?;
        self.recompute_locked(&mut guard, owner)
    }

    /// Delete every entry in an owner's ledger and recompute the profile
    /// back to zero XP.
    pub fn clear_xp(&self, owner: &OwnerId) -> Result<()> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);
        if !self.profiles.exists(owner) {
            return Err(LevelbookError::NotFound(format!("owner not found: {owner}")));
        }
        self.clear_ledger_locked(&mut guard, owner)?;
        self.recompute_locked(&mut guard, owner)?;
        Ok(())
    }

    /// Record a habit completion as one ledger entry and recompute.
    ///
    /// Binary habits award their reward once per call (`count` must be
    /// 1); counter habits award `xp_reward * count` with `count >= 1`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown habit, `Validation` for an inactive
    /// habit, a zero count, a count other than 1 on a binary habit, or
    /// an overflowing reward.
    pub fn complete_habit(
        &self,
        owner: &OwnerId,
        habit: &HabitId,
        count: u32,
        note: Option<String>,
    ) -> Result<RecomputeOutcome> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);

        let catalog = self.catalogs.load(owner)?;
        let def = catalog
            .habit(habit)
            .ok_or_else(|| LevelbookError::NotFound(format!("habit {habit}")))?;

        if !def.active {
            return Err(LevelbookError::Validation(format!(
                "habit '{}' is inactive",
                def.name
            )));
        }
        if count < 1 {
            return Err(LevelbookError::Validation(
                "completion count must be at least 1".into(),
            ));
        }
        if def.kind == HabitKind::Binary && count != 1 {
            return Err(LevelbookError::Validation(format!(
                "habit '{}' is binary and completes once per call",
                def.name
            )));
        }

        let amount = def
            .xp_reward
            .checked_mul(i64::from(count))
            .ok_or_else(|| LevelbookError::Validation("completion XP overflows".into()))?;

        let mut draft = EntryDraft::new(def.category.clone(), amount).source(
            XpSource::HabitCompletion {
                habit: def.id.clone(),
            },
        );
        if let Some(sub) = &def.sub_category {
            draft = draft.sub_category(sub.clone());
        }
        if let Some(note) = note {
            draft = draft.note(note);
        }

        let entry = draft.into_entry(owner);
        self.entries.save(&entry)?;
        self.hydrated(&mut guard, owner)?.insert(entry);
        self.recompute_locked(&mut guard, owner)
    }

    // ── Ledger reads ──────────────────────────────────────────────────────────

    /// List an owner's entries, most recent first, one page at a time.
    ///
    /// Pages are 1-based; a page past the end is an empty list.
    ///
    /// # Errors
    ///
    /// `Validation` when `page` or `page_size` is below 1, `NotFound`
    /// for an unknown owner.
    pub fn list_xp(&self, owner: &OwnerId, page: u32, page_size: u32) -> Result<Vec<XpEntry>> {
        if page < 1 || page_size < 1 {
            return Err(LevelbookError::Validation(
                "page and page_size must be at least 1".into(),
            ));
        }
        if !self.profiles.exists(owner) {
            return Err(LevelbookError::NotFound(format!("owner not found: {owner}")));
        }

        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);
        let index = self.hydrated(&mut guard, owner)?;

        let all = query_entries(
            index,
            &LedgerQuery {
                sort: SortOrder::NewestFirst,
                ..Default::default()
            },
        );
        let offset = (page as usize - 1) * page_size as usize;
        Ok(all
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    /// List an owner's entries inside `[from, to]` (microseconds, both
    /// edges inclusive), in ascending time order.
    ///
    /// # Errors
    ///
    /// `Validation` for an inverted window, `NotFound` for an unknown
    /// owner.
    pub fn list_xp_window(&self, owner: &OwnerId, from: u64, to: u64) -> Result<Vec<XpEntry>> {
        if from > to {
            return Err(LevelbookError::Validation(format!(
                "window start {from} is after window end {to}"
            )));
        }
        if !self.profiles.exists(owner) {
            return Err(LevelbookError::NotFound(format!("owner not found: {owner}")));
        }

        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);
        let index = self.hydrated(&mut guard, owner)?;
        Ok(index.by_time_range(from, to).into_iter().cloned().collect())
    }

    // ── Radar & streaks ───────────────────────────────────────────────────────

    /// Per-category radar stats for the given range, as of today (UTC).
    pub fn radar(&self, owner: &OwnerId, range: RadarRange) -> Result<Vec<RadarStat>> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);
        let config = self.rulebooks.load(owner)?;
        let catalog = self.catalogs.load(owner)?;
        let index = self.hydrated(&mut guard, owner)?;
        crate::radar::radar_stats(index, &catalog, &config, range, today_utc())
    }

    /// All-time sub-category breakdown grouped by category.
    pub fn sub_category_radar(&self, owner: &OwnerId) -> Result<Vec<CategoryWithSubRadar>> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);
        let config = self.rulebooks.load(owner)?;
        let catalog = self.catalogs.load(owner)?;
        let index = self.hydrated(&mut guard, owner)?;
        crate::radar::sub_category_radar(index, &catalog, &config, today_utc())
    }

    /// Current streak of completions for one habit, as of today (UTC).
    pub fn streak_for_habit(&self, owner: &OwnerId, habit: &HabitId) -> Result<u32> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);

        let catalog = self.catalogs.load(owner)?;
        if catalog.habit(habit).is_none() {
            return Err(LevelbookError::NotFound(format!("habit {habit}")));
        }

        let index = self.hydrated(&mut guard, owner)?;
        let entries = query_entries(
            index,
            &LedgerQuery {
                source: Some(XpSource::HabitCompletion {
                    habit: habit.clone(),
                }),
                ..Default::default()
            },
        );
        Ok(streak_from_entries(entries.into_iter(), today_utc()))
    }

    /// Current streak of activity in one sub-category, as of today (UTC).
    pub fn streak_for_sub_category(
        &self,
        owner: &OwnerId,
        sub_category: &SubCategoryId,
    ) -> Result<u32> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);

        let catalog = self.catalogs.load(owner)?;
        if catalog.sub_category(sub_category).is_none() {
            return Err(LevelbookError::NotFound(format!(
                "sub-category {sub_category}"
            )));
        }

        let index = self.hydrated(&mut guard, owner)?;
        let entries = index.by_sub_category(sub_category);
        Ok(streak_from_entries(entries.into_iter(), today_utc()))
    }

    /// Current streak of activity in one category, as of today (UTC).
    pub fn streak_for_category(&self, owner: &OwnerId, category: &CategoryId) -> Result<u32> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);

        let catalog = self.catalogs.load(owner)?;
        if catalog.category(category).is_none() {
            return Err(LevelbookError::NotFound(format!("category {category}")));
        }

        let index = self.hydrated(&mut guard, owner)?;
        let entries = index.by_category(category);
        Ok(streak_from_entries(entries.into_iter(), today_utc()))
    }

    // ── Rulebook ──────────────────────────────────────────────────────────────

    /// Load an owner's active rulebook config.
    pub fn rulebook(&self, owner: &OwnerId) -> Result<RulebookConfig> {
        let cell = self.owner_cell(owner);
        let _guard = lock_cell(&cell);
        self.rulebooks.load(owner)
    }

    /// Apply a patch to the owner's rulebook, validate the result,
    /// persist it, and recompute the profile under the new rules.
    ///
    /// On a validation failure nothing is written: the previous config
    /// stays active and the error names the offending field.
    pub fn update_rulebook(&self, owner: &OwnerId, patch: RulebookPatch) -> Result<RulebookConfig> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);

        let current = self.rulebooks.load(owner)?;
        let candidate = current.apply(patch);
        candidate.validate()?;

        self.rulebooks.save(&candidate)?;
        self.recompute_locked(&mut guard, owner)?;
        log::info!("rulebook updated for {owner}");
        Ok(candidate)
    }

    /// Replace the owner's rulebook with the default config and
    /// recompute the profile.
    pub fn reset_rulebook(&self, owner: &OwnerId) -> Result<RulebookConfig> {
        let cell = self.owner_cell(owner);
        let mut guard = lock_cell(&cell);

        // An owner must exist before its rulebook can be reset.
        self.rulebooks.load(owner)?;

        let config = RulebookConfig::default_for(owner.clone());
        self.rulebooks.save(&config)?;
        self.recompute_locked(&mut guard, owner)?;
        log::info!("rulebook reset for {owner}");
        Ok(config)
    }

    // ── Catalog ───────────────────────────────────────────────────────────────

    /// Load an owner's full catalog.
    pub fn catalog(&self, owner: &OwnerId) -> Result<Catalog> {
        let cell = self.owner_cell(owner);
        let _guard = lock_cell(&cell);
        self.catalogs.load(owner)
    }

    /// Add a category to the owner's catalog.
    pub fn add_category(
        &self,
        owner: &OwnerId,
        name: &str,
        color: Option<String>,
        icon: Option<String>,
    ) -> Result<Category> {
        let cell = self.owner_cell(owner);
        let _guard = lock_cell(&cell);

        let mut catalog = self.catalogs.load(owner)?;
        let id = catalog.add_category(name, color, icon)?;
        self.catalogs.save(&catalog)?;
        catalog
            .category(&id)
            .cloned()
            .ok_or_else(|| LevelbookError::NotFound(format!("category {id}")))
    }

    /// Add a sub-category under an existing category.
    pub fn add_sub_category(
        &self,
        owner: &OwnerId,
        category: &CategoryId,
        name: &str,
    ) -> Result<SubCategory> {
        let cell = self.owner_cell(owner);
        let _guard = lock_cell(&cell);

        let mut catalog = self.catalogs.load(owner)?;
        let id = catalog.add_sub_category(category, name)?;
        self.catalogs.save(&catalog)?;
        catalog
            .sub_category(&id)
            .cloned()
            .ok_or_else(|| LevelbookError::NotFound(format!("sub-category {id}")))
    }

    /// Add a habit to the owner's catalog.
    pub fn add_habit(
        &self,
        owner: &OwnerId,
        name: &str,
        kind: HabitKind,
        xp_reward: i64,
        category: &CategoryId,
        sub_category: Option<&SubCategoryId>,
    ) -> Result<Habit> {
        let cell = self.owner_cell(owner);
        let _guard = lock_cell(&cell);

        let mut catalog = self.catalogs.load(owner)?;
        let id = catalog.add_habit(name, kind, xp_reward, category, sub_category)?;
        self.catalogs.save(&catalog)?;
        catalog
            .habit(&id)
            .cloned()
            .ok_or_else(|| LevelbookError::NotFound(format!("habit {id}")))
    }

    /// Activate or deactivate a habit.
    pub fn set_habit_active(
        &self,
        owner: &OwnerId,
        habit: &HabitId,
        active: bool,
    ) -> Result<Habit> {
        let cell = self.owner_cell(owner);
        let _guard = lock_cell(&cell);

        let mut catalog = self.catalogs.load(owner)?;
        catalog.set_habit_active(habit, active)?;
        self.catalogs.save(&catalog)?;
        catalog
            .habit(habit)
            .cloned()
            .ok_or_else(|| LevelbookError::NotFound(format!("habit {habit}")))
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Fetch (or create) the mutex cell for an owner.
    fn owner_cell(&self, owner: &OwnerId) -> Arc<Mutex<OwnerCell>> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.entry(owner.clone()).or_default().clone()
    }

    /// Hydrate the owner's ledger index from disk on first access.
    fn hydrated<'a>(
        &self,
        cell: &'a mut OwnerCell,
        owner: &OwnerId,
    ) -> Result<&'a mut LedgerIndex> {
        if cell.index.is_none() {
            cell.index = Some(LedgerIndex::from_entries(self.entries.load_all(owner)?));
        }
        Ok(cell.index.get_or_insert_with(LedgerIndex::new))
    }

    /// Wipe the owner's ledger, on disk and in memory.
    fn clear_ledger_locked(&self, cell: &mut OwnerCell, owner: &OwnerId) -> Result<()> {
        self.entries.clear(owner)?;
        cell.index = Some(LedgerIndex::new());
        log::info!("cleared ledger for {owner}");
        Ok(())
    }

    /// Recompute the profile from the ledger sum under the active
    /// rulebook and persist it. Must be called with the owner's cell
    /// locked.
    fn recompute_locked(&self, cell: &mut OwnerCell, owner: &OwnerId) -> Result<RecomputeOutcome> {
        let config = self.rulebooks.load(owner)?;
        let total = self.hydrated(cell, owner)?.total_amount();
        // Negative totals resolve as zero XP; the stored sum keeps its sign.
        let resolution = resolve(total.max(0) as u64, &config)?;

        let mut profile = self.profiles.load(owner)?;
        let previous_level = profile.level;
        profile.apply(total, resolution);
        self.profiles.save(&profile)?;

        log::debug!(
            "recomputed {owner}: total_xp={total} level={} rank={}",
            profile.level,
            profile.rank
        );
        Ok(RecomputeOutcome {
            profile,
            previous_level,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
