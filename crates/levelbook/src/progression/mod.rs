//! Profiles and the progression service.
//!
//! - [`Profile`]: the per-owner materialized view (total XP, level,
//!   rank, title), always recomputed from the ledger rather than edited.
//! - [`ProgressionService`]: the orchestrator every mutation and read
//!   goes through. It owns the stores, serializes same-owner operations,
//!   and recomputes the profile after every ledger or rulebook change.

pub mod service;
pub mod types;

pub use service::ProgressionService;
pub use types::{Profile, RecomputeOutcome};
