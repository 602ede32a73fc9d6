//! Owner identity.
//!
//! An owner is the unit of isolation: every ledger entry, profile,
//! rulebook, and catalog belongs to exactly one owner, and operations on
//! different owners never contend.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Unique identifier for an owner.
///
/// Format: `own_` + base58 of first 16 bytes of SHA-256 over the display
/// name, creation instant, and a process-local sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

static OWNER_SEQ: AtomicU64 = AtomicU64::new(0);

impl OwnerId {
    /// Derive a fresh owner ID from a display name.
    pub fn derive(display_name: &str) -> Self {
        let seq = OWNER_SEQ.fetch_add(1, Ordering::Relaxed);
        let input = format!("{display_name}:{}:{seq}", crate::time::now_micros());
        let hash = Sha256::digest(input.as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("own_{encoded}"))
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
