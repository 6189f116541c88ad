//! Hidden achievement predicates.
//!
//! A hidden achievement has no public criteria. Each one is bound to a
//! predicate that reports progress toward a target from the user's stats.

use std::collections::HashMap;

use super::stats::UserStats;
use super::types::{AchievementId, HiddenProgress};

pub type HiddenPredicate = fn(&UserStats) -> HiddenProgress;

/// Achievement id → predicate.
#[derive(Clone, Default)]
pub struct HiddenRegistry {
    predicates: HashMap<AchievementId, HiddenPredicate>,
}

impl HiddenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: AchievementId, predicate: HiddenPredicate) {
        self.predicates.insert(id, predicate);
    }

    pub fn get(&self, id: &AchievementId) -> Option<HiddenPredicate> {
        self.predicates.get(id).copied()
    }

    pub fn contains(&self, id: &AchievementId) -> bool {
        self.predicates.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl std::fmt::Debug for HiddenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.predicates.keys().map(|id| id.0.as_str()).collect();
        ids.sort_unstable();
        f.debug_struct("HiddenRegistry").field("ids", &ids).finish()
    }
}

// ---------------------------------------------------------------------------
// Built-in predicates
// ---------------------------------------------------------------------------

pub const NIGHT_HOWLER_DAYS: u32 = 7;
pub const FESTIVAL_HOUND_FESTIVALS: usize = 3;
pub const PACK_MENTOR_MILESTONES: u32 = 5;
pub const FIRST_TO_THE_BOWL_COMMENTS: u32 = 10;
pub const WEEKEND_WANDERER_WEEKENDS: u32 = 4;
pub const DOG_ORACLE_PREDICTIONS: u32 = 10;
pub const DOG_ORACLE_ACCURACY: f64 = 0.8;

/// Active after midnight on consecutive days.
pub fn night_howler(stats: &UserStats) -> HiddenProgress {
    HiddenProgress::new(
        stats.consecutive_night_activity_days as f64,
        NIGHT_HOWLER_DAYS as f64,
    )
}

/// Distinct dog festivals attended.
pub fn festival_hound(stats: &UserStats) -> HiddenProgress {
    HiddenProgress::new(
        stats.distinct_festivals() as f64,
        FESTIVAL_HOUND_FESTIVALS as f64,
    )
}

/// Mentees who reached a milestone with this user's help.
pub fn pack_mentor(stats: &UserStats) -> HiddenProgress {
    HiddenProgress::new(
        stats.mentee_milestones as f64,
        PACK_MENTOR_MILESTONES as f64,
    )
}

/// First comment on a new question within minutes of posting.
pub fn first_to_the_bowl(stats: &UserStats) -> HiddenProgress {
    HiddenProgress::new(
        stats.fast_first_comments as f64,
        FIRST_TO_THE_BOWL_COMMENTS as f64,
    )
}

pub fn weekend_wanderer(stats: &UserStats) -> HiddenProgress {
    HiddenProgress::new(
        stats.weekend_activity_streak as f64,
        WEEKEND_WANDERER_WEEKENDS as f64,
    )
}

/// Enough predictions, made accurately. Volume and accuracy each
/// contribute a factor so partial progress stays meaningful.
pub fn dog_oracle(stats: &UserStats) -> HiddenProgress {
    let volume = (stats.predictions_made as f64 / DOG_ORACLE_PREDICTIONS as f64).min(1.0);
    let accuracy = (stats.prediction_accuracy() / DOG_ORACLE_ACCURACY).min(1.0);
    HiddenProgress::new(volume * accuracy, 1.0)
}
