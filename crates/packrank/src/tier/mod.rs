//! Tier progression: the reputation ladder.
//!
//! The tier module provides:
//! - The fixed bronze-to-diamond ladder with lifetime and monthly thresholds
//! - Point application and monthly requalification
//! - Progress, estimated time to the next tier, and unlocked benefits

pub mod engine;
pub mod types;

pub use types::{
    default_ladder, Tier, TierChange, TierDefinition, TierEta, TierHistoryEntry, TierState,
    TierStatus,
};

pub use engine::{apply_points, new_state, qualifying_tier, roll_month, tier_status};
