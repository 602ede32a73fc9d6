//! Rulebook persistence — one `rulebook.json` document per owner.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "rulebook": { ... RulebookConfig ... }
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LevelbookError, Result};
use crate::owner::OwnerId;
use crate::rulebook::RulebookConfig;

// ── File format constants ─────────────────────────────────────────────────────

const RULEBOOK_FILE_VERSION: u32 = 1;

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each rulebook.
#[derive(Debug, Serialize, Deserialize)]
struct RulebookFile {
    /// Format version number.
    version: u32,
    /// The stored config.
    rulebook: RulebookConfig,
}

// ── RulebookStore ─────────────────────────────────────────────────────────────

/// Filesystem-backed store for `RulebookConfig` documents, one per owner
/// at `{base_dir}/owners/{owner_id}/rulebook.json`.
///
/// The store persists whatever it is given; validation happens before a
/// config reaches this layer.
pub struct RulebookStore {
    base_dir: PathBuf,
}

impl RulebookStore {
    /// Create a new `RulebookStore` rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Persist a config, overwriting any previous document.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::SerializationError` if JSON serialization
    /// fails, or `LevelbookError::Io` for filesystem errors.
    pub fn save(&self, config: &RulebookConfig) -> Result<()> {
        let file = RulebookFile {
            version: RULEBOOK_FILE_VERSION,
            rulebook: config.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| LevelbookError::SerializationError(e.to_string()))?;

        let dir = self.owner_dir(&config.owner);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("rulebook.json"), json.as_bytes())?;

        Ok(())
    }

    /// Load an owner's rulebook config.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::NotFound` if the owner has no stored
    /// rulebook, `LevelbookError::InvalidFileFormat` if the file cannot
    /// be parsed, or `LevelbookError::Io` for other filesystem errors.
    pub fn load(&self, owner: &OwnerId) -> Result<RulebookConfig> {
        let path = self.owner_dir(owner).join("rulebook.json");

        if !path.exists() {
            return Err(LevelbookError::NotFound(format!(
                "rulebook not found for owner: {owner}"
            )));
        }

        let bytes = std::fs::read(&path)?;
        let file: RulebookFile = serde_json::from_slice(&bytes).map_err(|e| {
            LevelbookError::InvalidFileFormat(format!(
                "failed to parse rulebook file {}: {e}",
                path.display()
            ))
        })?;

        Ok(file.rulebook)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn owner_dir(&self, owner: &OwnerId) -> PathBuf {
        self.base_dir.join("owners").join(&owner.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
