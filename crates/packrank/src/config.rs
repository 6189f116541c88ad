//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config
//! file. The tier ladder and level curve are fixed shapes whose numbers
//! can be tuned here; they are not user-authorable rules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReputationError, Result};
use crate::quality::QualityTier;
use crate::tier::{default_ladder, TierDefinition};

/// Points paid for routine community activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointSchedule {
    pub upvote_received: u64,
    pub best_answer: u64,
    pub streak_day: u64,
    pub referral: u64,
    pub event_attendance: u64,
    pub question_asked: u64,
    /// Answer rewards indexed by quality tier, poor through outstanding.
    pub answer_by_quality: [u64; 5],
}

impl Default for PointSchedule {
    fn default() -> Self {
        Self {
            upvote_received: 2,
            best_answer: 25,
            streak_day: 5,
            referral: 50,
            event_attendance: 15,
            question_asked: 3,
            answer_by_quality: [5, 10, 15, 20, 25],
        }
    }
}

impl PointSchedule {
    /// Answer reward sized by the answer's quality tier.
    pub fn answer_points(&self, tier: QualityTier) -> u64 {
        self.answer_by_quality[tier.rank() as usize]
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Experience needed to go from level n to n+1 is `n * level_step`.
    ///
    /// The cumulative curve is triangular: with the default step of 100,
    /// level 2 is reached at 100 experience, level 3 at 300, level 4 at 600
    /// and level n at `level_step * n * (n - 1) / 2`. Experience is the
    /// lifetime earned total, so spending never lowers a level.
    pub level_step: u64,
    /// Window used for the average daily earn rate.
    pub trailing_window_days: u32,
    /// Fraction of a hidden achievement's target at which its hint shows.
    pub hint_threshold: f64,
    pub points: PointSchedule,
    pub tiers: Vec<TierDefinition>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            level_step: 100,
            trailing_window_days: 30,
            hint_threshold: 0.5,
            points: PointSchedule::default(),
            tiers: default_ladder(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let config: EngineConfig = serde_json::from_slice(&bytes).map_err(|e| {
            ReputationError::InvalidFileFormat(format!(
                "failed to parse config {}: {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the ladder and numeric settings for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.level_step == 0 {
            return Err(ReputationError::InvalidConfig(
                "level_step must be greater than zero".into(),
            ));
        }
        if self.trailing_window_days == 0 {
            return Err(ReputationError::InvalidConfig(
                "trailing_window_days must be greater than zero".into(),
            ));
        }
        if !(self.hint_threshold > 0.0 && self.hint_threshold <= 1.0) {
            return Err(ReputationError::InvalidConfig(format!(
                "hint_threshold must be in (0, 1], got {}",
                self.hint_threshold
            )));
        }

        let first = self
            .tiers
            .first()
            .ok_or_else(|| ReputationError::InvalidConfig("tier ladder is empty".into()))?;
        if first.min_points != 0 {
            return Err(ReputationError::InvalidConfig(format!(
                "lowest tier {} must start at 0 points",
                first.tier
            )));
        }
        for pair in self.tiers.windows(2) {
            if pair[1].tier.rank() <= pair[0].tier.rank() {
                return Err(ReputationError::InvalidConfig(format!(
                    "tier {} listed after {}",
                    pair[1].tier, pair[0].tier
                )));
            }
            if pair[1].min_points <= pair[0].min_points {
                return Err(ReputationError::InvalidConfig(format!(
                    "tier {} must require more points than {}",
                    pair[1].tier, pair[0].tier
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.level_step, 100);
        assert_eq!(config.tiers.len(), 5);
        assert_eq!(config.points.answer_points(QualityTier::Outstanding), 25);
    }

    #[test]
    fn test_unordered_ladder_rejected() {
        let mut config = EngineConfig::default();
        config.tiers.swap(1, 2);
        assert!(matches!(
            config.validate(),
            Err(ReputationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_ladder_must_start_at_zero() {
        let mut config = EngineConfig::default();
        config.tiers[0].min_points = 10;
        assert!(config.validate().is_err());
        assert_eq!(config.tiers[0].tier, Tier::Bronze);
    }

    #[test]
    fn test_level_step_curve() {
        let step = EngineConfig::default().level_step;
        let level = |xp| crate::ledger::level_for_experience(xp, step).level;
        assert_eq!(level(100), 2);
        assert_eq!(level(300), 3);
        assert_eq!(level(400), 3);
        assert_eq!(level(599), 3);
        assert_eq!(level(600), 4);
        assert_eq!(level(step * 10 * 9 / 2), 10);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packrank.json");
        std::fs::write(&path, r#"{"level_step": 50, "hint_threshold": 0.75}"#).unwrap();
        let config = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.level_step, 50);
        assert!((config.hint_threshold - 0.75).abs() < f64::EPSILON);

        std::fs::write(&path, r#"{"level_step": 0}"#).unwrap();
        assert!(EngineConfig::from_json_file(&path).is_err());
    }
}
