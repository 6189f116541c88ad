//! User statistics that achievement requirements are evaluated against.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A statistic value or a requirement threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Flag(bool),
    Number(f64),
    List(Vec<String>),
}

impl From<bool> for StatValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<f64> for StatValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<u32> for StatValue {
    fn from(v: u32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<u64> for StatValue {
    fn from(v: u64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<Vec<String>> for StatValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl From<&[&str]> for StatValue {
    fn from(v: &[&str]) -> Self {
        Self::List(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for StatValue {
    fn from(v: [&str; N]) -> Self {
        Self::List(v.iter().map(|s| s.to_string()).collect())
    }
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

// ---------------------------------------------------------------------------
// Statistic keys
// ---------------------------------------------------------------------------

pub const ANSWERS_POSTED: &str = "answers_posted";
pub const QUESTIONS_ASKED: &str = "questions_asked";
pub const UPVOTES_RECEIVED: &str = "upvotes_received";
pub const BEST_ANSWERS: &str = "best_answers";
pub const OUTSTANDING_ANSWERS: &str = "outstanding_answers";
pub const AVERAGE_ANSWER_QUALITY: &str = "average_answer_quality";
pub const EVENTS_ATTENDED: &str = "events_attended";
pub const EVENT_TYPES_ATTENDED: &str = "event_types_attended";
pub const GROUP_EVENTS_ORGANIZED: &str = "group_events_organized";
pub const REFERRALS_COMPLETED: &str = "referrals_completed";
pub const STREAK_DAYS: &str = "streak_days";
pub const PROFILE_COMPLETE: &str = "profile_complete";
pub const IS_VERIFIED_EXPERT: &str = "is_verified_expert";

// Filled by the engine before evaluation.
pub const ACHIEVEMENTS_UNLOCKED: &str = "achievements_unlocked";
pub const LEVEL: &str = "level";
pub const LIFETIME_POINTS: &str = "lifetime_points";
pub const TIER_RANK: &str = "tier_rank";

/// Activity snapshot supplied by the host platform.
///
/// Known keys map to typed fields; anything else goes in `custom`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub answers_posted: u32,
    pub questions_asked: u32,
    pub upvotes_received: u32,
    pub best_answers: u32,
    pub outstanding_answers: u32,
    pub average_answer_quality: f64,
    pub events_attended: u32,
    pub event_types_attended: Vec<String>,
    pub group_events_organized: u32,
    pub referrals_completed: u32,
    pub streak_days: u32,
    pub profile_complete: bool,
    pub is_verified_expert: bool,

    // Hidden achievement signals
    pub consecutive_night_activity_days: u32,
    pub festivals_attended: Vec<String>,
    pub mentee_milestones: u32,
    pub fast_first_comments: u32,
    pub weekend_activity_streak: u32,
    pub predictions_made: u32,
    pub predictions_correct: u32,

    // Derived
    pub achievements_unlocked: u32,
    pub level: u32,
    pub lifetime_points: u64,
    pub tier_rank: u8,

    pub custom: BTreeMap<String, StatValue>,
}

impl UserStats {
    /// Look up a statistic by requirement key.
    pub fn value(&self, key: &str) -> Option<StatValue> {
        let value = match key {
            ANSWERS_POSTED => self.answers_posted.into(),
            QUESTIONS_ASKED => self.questions_asked.into(),
            UPVOTES_RECEIVED => self.upvotes_received.into(),
            BEST_ANSWERS => self.best_answers.into(),
            OUTSTANDING_ANSWERS => self.outstanding_answers.into(),
            AVERAGE_ANSWER_QUALITY => self.average_answer_quality.into(),
            EVENTS_ATTENDED => self.events_attended.into(),
            EVENT_TYPES_ATTENDED => self.event_types_attended.clone().into(),
            GROUP_EVENTS_ORGANIZED => self.group_events_organized.into(),
            REFERRALS_COMPLETED => self.referrals_completed.into(),
            STREAK_DAYS => self.streak_days.into(),
            PROFILE_COMPLETE => self.profile_complete.into(),
            IS_VERIFIED_EXPERT => self.is_verified_expert.into(),
            ACHIEVEMENTS_UNLOCKED => self.achievements_unlocked.into(),
            LEVEL => self.level.into(),
            LIFETIME_POINTS => self.lifetime_points.into(),
            TIER_RANK => StatValue::Number(self.tier_rank as f64),
            other => return self.custom.get(other).cloned(),
        };
        Some(value)
    }

    /// Number of distinct festivals attended.
    pub fn distinct_festivals(&self) -> usize {
        self.festivals_attended
            .iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Fraction of predictions that were correct; 0 with no predictions.
    pub fn prediction_accuracy(&self) -> f64 {
        if self.predictions_made == 0 {
            return 0.0;
        }
        (self.predictions_correct.min(self.predictions_made) as f64) / self.predictions_made as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. Known keys resolve to typed fields
    #[test]
    fn test_known_keys() {
        let stats = UserStats {
            answers_posted: 12,
            profile_complete: true,
            event_types_attended: vec!["hike".into()],
            ..Default::default()
        };
        assert_eq!(stats.value(ANSWERS_POSTED), Some(StatValue::Number(12.0)));
        assert_eq!(stats.value(PROFILE_COMPLETE), Some(StatValue::Flag(true)));
        assert_eq!(
            stats.value(EVENT_TYPES_ATTENDED),
            Some(StatValue::List(vec!["hike".into()]))
        );
    }

    // 2. Unknown keys fall through to custom, then to None
    #[test]
    fn test_custom_and_missing_keys() {
        let mut stats = UserStats::default();
        stats.custom.insert("photos_shared".into(), StatValue::Number(4.0));
        assert_eq!(stats.value("photos_shared"), Some(StatValue::Number(4.0)));
        assert_eq!(stats.value("no_such_stat"), None);
    }

    // 3. Festival names are deduplicated case-insensitively
    #[test]
    fn test_distinct_festivals() {
        let stats = UserStats {
            festivals_attended: vec!["Bark Fest".into(), "bark fest".into(), "Woofstock".into(), " ".into()],
            ..Default::default()
        };
        assert_eq!(stats.distinct_festivals(), 2);
    }

    // 4. Untagged serde reads plain JSON values
    #[test]
    fn test_stat_value_json() {
        let v: StatValue = serde_json::from_str("5").unwrap();
        assert_eq!(v, StatValue::Number(5.0));
        let v: StatValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, StatValue::Flag(true));
        let v: StatValue = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(v, StatValue::List(vec!["a".into(), "b".into()]));
    }
}
