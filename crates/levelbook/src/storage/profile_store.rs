//! Profile persistence — one `profile.json` document per owner.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "profile": { ... Profile ... }
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LevelbookError, Result};
use crate::owner::OwnerId;
use crate::progression::Profile;

// ── File format constants ─────────────────────────────────────────────────────

const PROFILE_FILE_VERSION: u32 = 1;

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each profile.
#[derive(Debug, Serialize, Deserialize)]
struct ProfileFile {
    /// Format version number.
    version: u32,
    /// The stored profile.
    profile: Profile,
}

// ── ProfileStore ──────────────────────────────────────────────────────────────

/// Filesystem-backed store for `Profile` documents.
///
/// Each owner has exactly one profile at
/// `{base_dir}/owners/{owner_id}/profile.json`. The presence of that file
/// is what makes an owner known to the engine.
pub struct ProfileStore {
    base_dir: PathBuf,
}

impl ProfileStore {
    /// Create a new `ProfileStore` rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Persist a profile, overwriting any previous document.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::SerializationError` if JSON serialization
    /// fails, or `LevelbookError::Io` for filesystem errors.
    pub fn save(&self, profile: &Profile) -> Result<()> {
        let file = ProfileFile {
            version: PROFILE_FILE_VERSION,
            profile: profile.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| LevelbookError::SerializationError(e.to_string()))?;

        let dir = self.owner_dir(&profile.owner);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("profile.json"), json.as_bytes())?;

        Ok(())
    }

    /// Load an owner's profile.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::NotFound` for an unknown owner,
    /// `LevelbookError::InvalidFileFormat` if the file cannot be parsed,
    /// or `LevelbookError::Io` for other filesystem errors.
    pub fn load(&self, owner: &OwnerId) -> Result<Profile> {
        let path = self.owner_dir(owner).join("profile.json");

        if !path.exists() {
            return Err(LevelbookError::NotFound(format!("owner not found: {owner}")));
        }

        let bytes = std::fs::read(&path)?;
        let file: ProfileFile = serde_json::from_slice(&bytes).map_err(|e| {
            LevelbookError::InvalidFileFormat(format!(
                "failed to parse profile file {}: {e}",
                path.display()
            ))
        })?;

        Ok(file.profile)
    }

    /// Whether a profile document exists for `owner`.
    pub fn exists(&self, owner: &OwnerId) -> bool {
        self.owner_dir(owner).join("profile.json").exists()
    }

    /// List every owner known to the store, in unspecified order.
    ///
    /// An owner counts as known when its directory holds a profile
    /// document.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::Io` if the owners directory cannot be read.
    pub fn list_owners(&self) -> Result<Vec<OwnerId>> {
        let owners_dir = self.base_dir.join("owners");
        if !owners_dir.exists() {
            return Ok(Vec::new());
        }

        let mut owners = Vec::new();
        for dir_entry in std::fs::read_dir(&owners_dir)? {
            let dir_entry = dir_entry?;
            if dir_entry.path().join("profile.json").exists() {
                owners.push(OwnerId(dir_entry.file_name().to_string_lossy().into_owned()));
            }
        }

        Ok(owners)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn owner_dir(&self, owner: &OwnerId) -> PathBuf {
        self.base_dir.join("owners").join(&owner.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
