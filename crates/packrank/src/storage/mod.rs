//! Storage layer for ledgers, account snapshots, tiers, and achievement progress.
//!
//! Two backends implement [`ReputationStore`]: [`MemoryStore`] for tests
//! and embedding, and [`FileStore`] for versioned JSON files on disk.
//!
//! # Directory layout
//!
//! By convention the default root is `~/.packrank/`:
//!
//! ```text
//! ~/.packrank/
//! ├── ledger/
//! │   └── {user}/
//! │       └── {sequence:010}.json
//! ├── accounts/
//! │   └── {user}.json
//! ├── tiers/
//! │   └── {user}.json
//! ├── achievements/
//! │   └── {user}/
//! │       └── {achievement_id}.json
//! └── chains/
//!     └── {user}/
//!         └── {chain_id}.json
//! ```
//!
//! The ledger rows are the source of truth. Accounts are snapshots that can
//! be rebuilt from them.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

use crate::achievement::{ChainProgress, UserAchievementProgress};
use crate::error::Result;
use crate::ledger::{PointTransaction, PointsAccount, UserId};
use crate::tier::TierState;

/// Persistence for everything the engine keeps per user.
///
/// Implementations need not coordinate writers for the same user; the
/// engine serializes those through its per-user locks.
pub trait ReputationStore: Send + Sync {
    /// Append a ledger row. Fails if `transaction.sequence` is not the
    /// user's current transaction count.
    fn append_transaction(&self, transaction: &PointTransaction) -> Result<()>;

    /// The user's ledger, ordered by sequence.
    fn transactions(&self, user: &UserId) -> Result<Vec<PointTransaction>>;

    fn transaction_count(&self, user: &UserId) -> Result<u64>;

    fn load_account(&self, user: &UserId) -> Result<Option<PointsAccount>>;
    fn save_account(&self, account: &PointsAccount) -> Result<()>;

    fn load_tier_state(&self, user: &UserId) -> Result<Option<TierState>>;
    fn save_tier_state(&self, state: &TierState) -> Result<()>;

    fn achievement_progress(&self, user: &UserId) -> Result<Vec<UserAchievementProgress>>;
    fn save_achievement_progress(&self, progress: &UserAchievementProgress) -> Result<()>;

    fn chain_progress(&self, user: &UserId) -> Result<Vec<ChainProgress>>;
    fn save_chain_progress(&self, progress: &ChainProgress) -> Result<()>;

    /// Users with an account snapshot, sorted.
    fn users(&self) -> Result<Vec<UserId>>;
}
