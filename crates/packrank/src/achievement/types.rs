//! Data structures for achievements, chains, and per-user progress.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ledger::{TransactionId, UserId};

use super::stats::StatValue;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Achievement identifier (e.g. "first_answer").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AchievementId(pub String);

impl AchievementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for AchievementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chain identifier (e.g. "helpful_paw").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementType {
    Standard,
    Progressive,
    Hidden,
    Collaborative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Community,
    Expertise,
    Events,
    Engagement,
    Mentorship,
    Exploration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

// ---------------------------------------------------------------------------
// Requirements and rewards
// ---------------------------------------------------------------------------

/// Availability window; outside it the achievement cannot be unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    pub starts_at: u64,
    pub ends_at: u64,
}

impl Timeframe {
    pub fn contains(&self, now: u64) -> bool {
        now >= self.starts_at && now <= self.ends_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    /// Statistic key → threshold. Hidden achievements leave this empty and
    /// use a registered predicate instead.
    pub criteria: BTreeMap<String, StatValue>,
    pub dependencies: Vec<AchievementId>,
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rewards {
    pub points: u64,
    pub badges: Vec<String>,
    pub perks: Vec<String>,
    /// Platform features opened by this achievement.
    pub unlocks: Vec<String>,
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Catalog entry. Static, shared by every user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: AchievementId,
    pub chain_id: Option<ChainId>,
    pub level: Option<u32>,
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub achievement_type: AchievementType,
    pub is_hidden: bool,
    pub discovery_hint: Option<String>,
    pub requirements: Requirements,
    pub rewards: Rewards,
    pub rarity: Rarity,
}

impl AchievementDefinition {
    fn base(
        id: &str,
        name: &str,
        description: &str,
        category: AchievementCategory,
        achievement_type: AchievementType,
        rarity: Rarity,
        points: u64,
    ) -> Self {
        Self {
            id: AchievementId::new(id),
            chain_id: None,
            level: None,
            name: name.to_string(),
            description: description.to_string(),
            category,
            achievement_type,
            is_hidden: false,
            discovery_hint: None,
            requirements: Requirements::default(),
            rewards: Rewards {
                points,
                ..Rewards::default()
            },
            rarity,
        }
    }

    /// A visible, threshold-based achievement.
    pub fn standard(
        id: &str,
        name: &str,
        description: &str,
        category: AchievementCategory,
        rarity: Rarity,
        points: u64,
    ) -> Self {
        Self::base(id, name, description, category, AchievementType::Standard, rarity, points)
    }

    /// A group achievement, earned through activity involving other members.
    pub fn collaborative(
        id: &str,
        name: &str,
        description: &str,
        category: AchievementCategory,
        rarity: Rarity,
        points: u64,
    ) -> Self {
        Self::base(id, name, description, category, AchievementType::Collaborative, rarity, points)
    }

    /// A hidden achievement. Its predicate is registered separately.
    pub fn hidden(
        id: &str,
        name: &str,
        description: &str,
        category: AchievementCategory,
        rarity: Rarity,
        points: u64,
        hint: &str,
    ) -> Self {
        let mut def =
            Self::base(id, name, description, category, AchievementType::Hidden, rarity, points);
        def.is_hidden = true;
        def.discovery_hint = Some(hint.to_string());
        def
    }

    /// One level of a progressive chain.
    #[allow(clippy::too_many_arguments)]
    pub fn chain_level(
        chain_id: &str,
        level: u32,
        id: &str,
        name: &str,
        description: &str,
        category: AchievementCategory,
        rarity: Rarity,
        points: u64,
    ) -> Self {
        let mut def = Self::base(
            id,
            name,
            description,
            category,
            AchievementType::Progressive,
            rarity,
            points,
        );
        def.chain_id = Some(ChainId::new(chain_id));
        def.level = Some(level);
        def
    }

    pub fn requires(mut self, key: &str, threshold: impl Into<StatValue>) -> Self {
        self.requirements
            .criteria
            .insert(key.to_string(), threshold.into());
        self
    }

    pub fn depends_on(mut self, id: &str) -> Self {
        self.requirements.dependencies.push(AchievementId::new(id));
        self
    }

    pub fn available_between(mut self, starts_at: u64, ends_at: u64) -> Self {
        self.requirements.timeframe = Some(Timeframe { starts_at, ends_at });
        self
    }

    pub fn badge(mut self, badge: &str) -> Self {
        self.rewards.badges.push(badge.to_string());
        self
    }

    pub fn perk(mut self, perk: &str) -> Self {
        self.rewards.perks.push(perk.to_string());
        self
    }

    pub fn unlocks(mut self, feature: &str) -> Self {
        self.rewards.unlocks.push(feature.to_string());
        self
    }
}

/// Ordered sequence of achievements representing progressive mastery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementChain {
    pub id: ChainId,
    pub name: String,
    pub total_levels: u32,
    /// Ordered by level, starting at 1.
    pub achievements: Vec<AchievementDefinition>,
}

impl AchievementChain {
    pub fn new(id: &str, name: &str, achievements: Vec<AchievementDefinition>) -> Self {
        Self {
            id: ChainId::new(id),
            name: name.to_string(),
            total_levels: achievements.len() as u32,
            achievements,
        }
    }

    /// Definition for a 1-based level.
    pub fn level(&self, level: u32) -> Option<&AchievementDefinition> {
        level
            .checked_sub(1)
            .and_then(|i| self.achievements.get(i as usize))
    }
}

// ---------------------------------------------------------------------------
// Per-user progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAchievementProgress {
    pub user_id: UserId,
    pub achievement_id: AchievementId,
    /// Progress toward unlocking, in [0, 100].
    pub progress_percentage: f64,
    pub current_values: BTreeMap<String, StatValue>,
    pub unlocked_at: Option<u64>,
    pub is_discovered: bool,
    pub discovered_at: Option<u64>,
}

impl UserAchievementProgress {
    pub fn new(user_id: UserId, definition: &AchievementDefinition) -> Self {
        Self {
            user_id,
            achievement_id: definition.id.clone(),
            progress_percentage: 0.0,
            current_values: BTreeMap::new(),
            unlocked_at: None,
            is_discovered: !definition.is_hidden,
            discovered_at: None,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainProgress {
    pub user_id: UserId,
    pub chain_id: ChainId,
    /// Highest completed level; 0 when none.
    pub current_level: u32,
    pub completed_at: Option<u64>,
    /// Statistic values observed for the next level on the last pass.
    pub progress_data: BTreeMap<String, StatValue>,
}

impl ChainProgress {
    pub fn new(user_id: UserId, chain_id: ChainId) -> Self {
        Self {
            user_id,
            chain_id,
            current_level: 0,
            completed_at: None,
            progress_data: BTreeMap::new(),
        }
    }
}

/// Progress reported by a hidden achievement's predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HiddenProgress {
    pub current: f64,
    pub target: f64,
}

impl HiddenProgress {
    pub fn new(current: f64, target: f64) -> Self {
        Self { current, target }
    }

    pub fn is_met(&self) -> bool {
        self.current.is_finite() && self.current >= self.target
    }

    /// Fraction of the target reached, in [0, 1].
    pub fn fraction(&self) -> f64 {
        if !self.current.is_finite() || !self.target.is_finite() {
            return 0.0;
        }
        if self.target <= 0.0 {
            return 1.0;
        }
        (self.current / self.target).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Evaluation and listing output
// ---------------------------------------------------------------------------

/// An achievement unlocked during an evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub id: AchievementId,
    pub name: String,
    pub rarity: Rarity,
    pub chain: Option<(ChainId, u32)>,
    pub points_awarded: u64,
    pub badges: Vec<String>,
    pub perks: Vec<String>,
    pub unlocks: Vec<String>,
    pub unlocked_at: u64,
    pub transaction_id: Option<TransactionId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub include_locked: bool,
    /// Show locked hidden achievements as masked entries.
    pub include_hidden: bool,
}

/// One achievement as shown to its user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementView {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub points: u64,
    pub chain_id: Option<ChainId>,
    pub level: Option<u32>,
    pub progress_percentage: f64,
    pub unlocked_at: Option<u64>,
    pub is_hidden: bool,
}

/// Hint toward an undiscovered hidden achievement. Carries no id or name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryHint {
    pub hint: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub progress_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementListing {
    pub unlocked: Vec<AchievementView>,
    pub locked_visible: Vec<AchievementView>,
    pub hints: Vec<DiscoveryHint>,
}
