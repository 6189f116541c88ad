//! PackRank: gamification and reputation engine for a dog-owner community.
//!
//! Provides a hash-chained points ledger with levels and streaks, answer
//! quality scoring, achievements with progressive chains and hidden
//! discoveries, and a tier ladder with monthly requalification.

pub mod achievement;
pub mod activity;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod quality;
pub mod storage;
pub mod tier;
pub mod time;

// Re-export primary types
pub use engine::{ActivityOutcome, EvaluationOutcome, ReputationEngine};
pub use error::{ReputationError, Result};

pub use activity::ActivityEvent;
pub use config::{EngineConfig, PointSchedule};
pub use storage::{FileStore, MemoryStore, ReputationStore};
pub use time::{Clock, ManualClock, SystemClock};

// Re-export ledger types
pub use ledger::{
    LedgerVerification, LevelInfo, LevelUp, PointSource, PointTransaction, PointsAccount,
    SortOrder, TransactionId, TransactionKind, TransactionQuery, TransactionResult, UserId,
};

// Re-export quality types
pub use quality::{
    AuthorCredibility, Engagement, QualityFactors, QualityScore, QualityTier, ScoreRequest,
};

// Re-export achievement types
pub use achievement::{
    AchievementCatalog, AchievementDefinition, AchievementId, AchievementListing, ChainId,
    ListOptions, UnlockedAchievement, UserStats,
};

// Re-export tier types
pub use tier::{Tier, TierChange, TierEta, TierState, TierStatus};
