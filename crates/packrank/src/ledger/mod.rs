//! Points ledger: append-only transaction log and derived accounts.
//!
//! The ledger module provides:
//! - Hash-chained point transactions (earn and spend)
//! - Account snapshots folded from the log (balance, totals, level, streak)
//! - The level curve
//! - Ledger verification against the cached snapshot
//! - Transaction history queries

pub mod engine;
pub mod query;
pub mod types;
pub mod verify;

pub use types::{
    level_for_experience, LedgerVerification, LevelInfo, LevelUp, PointSource, PointTransaction,
    PointsAccount, TransactionId, TransactionKind, TransactionResult, UserId,
};

pub use engine::seal_transaction;
pub use query::{earned_between, query_transactions, SortOrder, TransactionQuery};
pub use verify::verify_ledger;
