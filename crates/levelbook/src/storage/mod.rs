//! Storage layer for profiles, rulebooks, catalogs, and ledger entries.
//!
//! Everything is plain JSON on disk, one document per file, partitioned
//! by owner.
//!
//! # Directory layout
//!
//! By convention the default root is `~/.levelbook/` (overridable via the
//! `LEVELBOOK_DIR` environment variable), with sub-directories created
//! lazily by each store:
//!
//! ```text
//! ~/.levelbook/
//! └── owners/
//!     └── {owner_id}/
//!         ├── profile.json
//!         ├── rulebook.json
//!         ├── catalog.json
//!         └── ledger/
//!             └── {entry_id}.json
//! ```
//!
//! # Modules
//!
//! - [`profile_store`] — one `Profile` document per owner.
//! - [`rulebook_store`] — one `RulebookConfig` document per owner.
//! - [`catalog_store`] — one `Catalog` document per owner.
//! - [`entry_store`] — CRUD for `XpEntry` records, one file per entry.

pub mod catalog_store;
pub mod entry_store;
pub mod profile_store;
pub mod rulebook_store;

// Re-export the primary types so callers can write `storage::EntryStore`
// without reaching into sub-modules.
pub use catalog_store::CatalogStore;
pub use entry_store::EntryStore;
pub use profile_store::ProfileStore;
pub use rulebook_store::RulebookStore;
