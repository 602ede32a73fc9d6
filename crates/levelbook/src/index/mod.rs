//! In-memory index over one owner's ledger entries.
//!
//! The progression service hydrates a [`LedgerIndex`] per owner and keeps
//! it in step with the entry store. It holds owned copies of the records
//! and supports O(1) lookups by primary key, set lookups by grouping key,
//! and ordered range scans by timestamp — the (owner, timestamp) access
//! path every windowed aggregate runs on.

use std::collections::{BTreeMap, HashMap};

use crate::habit::{CategoryId, SubCategoryId};
use crate::ledger::{EntryId, XpEntry};

/// In-memory index over [`XpEntry`] records for a single owner.
///
/// Unlike an append-only log index, entries here can be removed or
/// replaced in place (ledger edits), so every mutation maintains all
/// four indexes.
pub struct LedgerIndex {
    /// Primary store: entry ID → entry.
    by_id: HashMap<EntryId, XpEntry>,
    /// Secondary index: category → list of entry IDs.
    by_category: HashMap<CategoryId, Vec<EntryId>>,
    /// Secondary index: sub-category → list of entry IDs.
    by_sub_category: HashMap<SubCategoryId, Vec<EntryId>>,
    /// Ordered secondary index: timestamp → list of entry IDs.
    ///
    /// Using a `BTreeMap` gives us cheap range queries without sorting.
    by_time: BTreeMap<u64, Vec<EntryId>>,
}

impl LedgerIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            by_category: HashMap::new(),
            by_sub_category: HashMap::new(),
            by_time: BTreeMap::new(),
        }
    }

    /// Build an index from a hydrated entry set.
    pub fn from_entries(entries: Vec<XpEntry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    /// Insert an entry into all four indexes. An existing entry with the
    /// same ID is fully replaced, secondary indexes included.
    pub fn insert(&mut self, entry: XpEntry) {
        if self.by_id.contains_key(&entry.id) {
            self.remove(&entry.id.clone());
        }

        let id = entry.id.clone();
        let category = entry.category.clone();
        let sub_category = entry.sub_category.clone();
        let ts = entry.recorded_at;

        self.by_id.insert(id.clone(), entry);
        self.by_category
            .entry(category)
            .or_default()
            .push(id.clone());
        if let Some(sub) = sub_category {
            self.by_sub_category.entry(sub).or_default().push(id.clone());
        }
        self.by_time.entry(ts).or_default().push(id);
    }

    /// Remove an entry from all four indexes, returning it if present.
    pub fn remove(&mut self, id: &EntryId) -> Option<XpEntry> {
        let entry = self.by_id.remove(id)?;

        if let Some(ids) = self.by_category.get_mut(&entry.category) {
            ids.retain(|eid| eid != id);
            if ids.is_empty() {
                self.by_category.remove(&entry.category);
            }
        }
        if let Some(sub) = &entry.sub_category {
            if let Some(ids) = self.by_sub_category.get_mut(sub) {
                ids.retain(|eid| eid != id);
                if ids.is_empty() {
                    self.by_sub_category.remove(sub);
                }
            }
        }
        if let Some(ids) = self.by_time.get_mut(&entry.recorded_at) {
            ids.retain(|eid| eid != id);
            if ids.is_empty() {
                self.by_time.remove(&entry.recorded_at);
            }
        }

        Some(entry)
    }

    /// Look up a single entry by its ID.
    pub fn get(&self, id: &EntryId) -> Option<&XpEntry> {
        self.by_id.get(id)
    }

    /// Return all entries filed under `category`.
    pub fn by_category(&self, category: &CategoryId) -> Vec<&XpEntry> {
        self.by_category
            .get(category)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }

    /// Return all entries filed under `sub_category`.
    pub fn by_sub_category(&self, sub_category: &SubCategoryId) -> Vec<&XpEntry> {
        self.by_sub_category
            .get(sub_category)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }

    /// Return all entries whose timestamp falls within `[from, to]`
    /// (inclusive), in ascending time order. An inverted window is
    /// empty.
    pub fn by_time_range(&self, from: u64, to: u64) -> Vec<&XpEntry> {
        if from > to {
            return Vec::new();
        }
        self.by_time
            .range(from..=to)
            .flat_map(|(_ts, ids)| ids.iter().filter_map(|id| self.by_id.get(id)))
            .collect()
    }

    /// Return every entry in the index, in unspecified order.
    pub fn iter_all(&self) -> Vec<&XpEntry> {
        self.by_id.values().collect()
    }

    /// Sum of all entry amounts — the owner's running XP total.
    pub fn total_amount(&self) -> i64 {
        self.by_id.values().map(|e| e.amount).sum()
    }

    /// Return the total number of entries stored.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Return `true` when the index contains no entries.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for LedgerIndex {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
