//! Ledger persistence — store and retrieve `XpEntry` records.
//!
//! Each entry is stored as a single JSON file named `{entry_id}.json`
//! inside the owner's ledger directory.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "entry": { ... XpEntry ... }
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LevelbookError, Result};
use crate::ledger::{EntryId, XpEntry};
use crate::owner::OwnerId;

// ── File format constants ─────────────────────────────────────────────────────

const ENTRY_FILE_VERSION: u32 = 1;

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each entry.
#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    /// Format version number.
    version: u32,
    /// The stored entry.
    entry: XpEntry,
}

// ── EntryStore ────────────────────────────────────────────────────────────────

/// Filesystem-backed store for `XpEntry` records, partitioned by owner.
///
/// Each entry is written to a dedicated JSON file named by its ID under
/// `{base_dir}/owners/{owner_id}/ledger/`. The store is safe for
/// single-process use; concurrent writes from multiple processes are not
/// coordinated.
pub struct EntryStore {
    base_dir: PathBuf,
}

impl EntryStore {
    /// Create a new `EntryStore` rooted at `base_dir`.
    ///
    /// The directory and any missing parents are created if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Persist an entry to disk.
    ///
    /// Writes `{owner}/ledger/{entry_id}.json`, creating the owner's
    /// ledger directory on first use. Any existing file with the same ID
    /// is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::SerializationError` if JSON serialization
    /// fails, or `LevelbookError::Io` for filesystem errors.
    pub fn save(&self, entry: &XpEntry) -> Result<()> {
        let file = EntryFile {
            version: ENTRY_FILE_VERSION,
            entry: entry.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| LevelbookError::SerializationError(e.to_string()))?;

        let dir = self.ledger_dir(&entry.owner);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(self.entry_path(&entry.owner, &entry.id), json.as_bytes())?;

        Ok(())
    }

    /// Load an entry by its ID.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::NotFound` if no file exists for `id`,
    /// `LevelbookError::InvalidFileFormat` if the file cannot be parsed,
    /// or `LevelbookError::Io` for other filesystem errors.
    pub fn load(&self, owner: &OwnerId, id: &EntryId) -> Result<XpEntry> {
        let path = self.entry_path(owner, id);

        if !path.exists() {
            return Err(LevelbookError::NotFound(format!("entry not found: {id}")));
        }

        let bytes = std::fs::read(&path)?;
        let file: EntryFile = serde_json::from_slice(&bytes).map_err(|e| {
            LevelbookError::InvalidFileFormat(format!(
                "failed to parse entry file {}: {e}",
                path.display()
            ))
        })?;

        Ok(file.entry)
    }

    /// Load every entry in an owner's ledger.
    ///
    /// An owner with no ledger directory yet simply has no entries. The
    /// returned list is not sorted in any particular order.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::InvalidFileFormat` for an unparseable
    /// file, or `LevelbookError::Io` for filesystem errors.
    pub fn load_all(&self, owner: &OwnerId) -> Result<Vec<XpEntry>> {
        let dir = self.ledger_dir(owner);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&dir)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                entries.push(self.load(owner, &EntryId(stem.to_string()))?);
            }
        }

        Ok(entries)
    }

    /// List the IDs of all entries stored for an owner.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::Io` if the directory cannot be read.
    pub fn list(&self, owner: &OwnerId) -> Result<Vec<EntryId>> {
        let dir = self.ledger_dir(owner);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for dir_entry in std::fs::read_dir(&dir)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                ids.push(EntryId(stem.to_string()));
            }
        }

        Ok(ids)
    }

    /// Delete the file for an entry by its ID.
    ///
    /// If no file exists for `id`, this is a no-op (returns `Ok`);
    /// existence checks belong to the caller, which has the ledger index.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::Io` for filesystem errors other than
    /// "not found".
    pub fn delete(&self, owner: &OwnerId, id: &EntryId) -> Result<()> {
        match std::fs::remove_file(self.entry_path(owner, id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LevelbookError::Io(e)),
        }
    }

    /// Delete an owner's entire ledger directory.
    ///
    /// A missing directory is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::Io` for filesystem errors other than
    /// "not found".
    pub fn clear(&self, owner: &OwnerId) -> Result<()> {
        match std::fs::remove_dir_all(self.ledger_dir(owner)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LevelbookError::Io(e)),
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn ledger_dir(&self, owner: &OwnerId) -> PathBuf {
        self.base_dir.join("owners").join(&owner.0).join("ledger")
    }

    /// Build the filesystem path for an entry ID.
    fn entry_path(&self, owner: &OwnerId, id: &EntryId) -> PathBuf {
        self.ledger_dir(owner).join(format!("{}.json", id.0))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
