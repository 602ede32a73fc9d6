//! Catalog persistence — one `catalog.json` document per owner.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "catalog": { ... Catalog ... }
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LevelbookError, Result};
use crate::habit::Catalog;
use crate::owner::OwnerId;

// ── File format constants ─────────────────────────────────────────────────────

const CATALOG_FILE_VERSION: u32 = 1;

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each catalog.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    /// Format version number.
    version: u32,
    /// The stored catalog.
    catalog: Catalog,
}

// ── CatalogStore ──────────────────────────────────────────────────────────────

/// Filesystem-backed store for `Catalog` documents, one per owner at
/// `{base_dir}/owners/{owner_id}/catalog.json`.
pub struct CatalogStore {
    base_dir: PathBuf,
}

impl CatalogStore {
    /// Create a new `CatalogStore` rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Persist a catalog, overwriting any previous document.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::SerializationError` if JSON serialization
    /// fails, or `LevelbookError::Io` for filesystem errors.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let file = CatalogFile {
            version: CATALOG_FILE_VERSION,
            catalog: catalog.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| LevelbookError::SerializationError(e.to_string()))?;

        let dir = self.owner_dir(&catalog.owner);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("catalog.json"), json.as_bytes())?;

        Ok(())
    }

    /// Load an owner's catalog.
    ///
    /// # Errors
    ///
    /// Returns `LevelbookError::NotFound` if the owner has no stored
    /// catalog, `LevelbookError::InvalidFileFormat` if the file cannot be
    /// parsed, or `LevelbookError::Io` for other filesystem errors.
    pub fn load(&self, owner: &OwnerId) -> Result<Catalog> {
        let path = self.owner_dir(owner).join("catalog.json");

        if !path.exists() {
            return Err(LevelbookError::NotFound(format!(
                "catalog not found for owner: {owner}"
            )));
        }

        let bytes = std::fs::read(&path)?;
        let file: CatalogFile = serde_json::from_slice(&bytes).map_err(|e| {
            LevelbookError::InvalidFileFormat(format!(
                "failed to parse catalog file {}: {e}",
                path.display()
            ))
        })?;

        Ok(file.catalog)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn owner_dir(&self, owner: &OwnerId) -> PathBuf {
        self.base_dir.join("owners").join(&owner.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
