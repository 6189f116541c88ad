//! Achievements: milestones, progressive chains, and hidden discoveries.
//!
//! The achievement module provides:
//! - A validated catalog of standalone, collaborative, hidden, and chained achievements
//! - Typed requirement checks against a user's activity statistics
//! - Evaluation passes planned as pure functions over stored progress
//! - Listings that keep hidden achievements silent until unlocked

pub mod catalog;
pub mod engine;
pub mod hidden;
pub mod stats;
pub mod types;

pub use catalog::{default_catalog, AchievementCatalog, CatalogBuilder};
pub use engine::{
    check_criterion, check_requirements, list_achievements, plan_pass, CriterionCheck, PassInput,
    PassPlan, PlannedUnlock, RequirementCheck,
};
pub use hidden::{HiddenPredicate, HiddenRegistry};
pub use stats::{StatValue, UserStats};
pub use types::{
    AchievementCategory, AchievementChain, AchievementDefinition, AchievementId,
    AchievementListing, AchievementType, AchievementView, ChainId, ChainProgress, DiscoveryHint,
    HiddenProgress, ListOptions, Rarity, Requirements, Rewards, Timeframe, UnlockedAchievement,
    UserAchievementProgress,
};
