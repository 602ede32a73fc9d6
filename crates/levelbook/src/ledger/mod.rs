//! XP ledger — the signed-amount event log everything else derives from.
//!
//! The ledger module provides:
//! - `XpEntry`, the persisted XP event record
//! - `EntryDraft` for building entries before they are committed
//! - `EntryPatch` for in-place edits that keep identity fields fixed

pub mod entry;

pub use entry::{EntryDraft, EntryId, EntryPatch, XpEntry, XpSource};
