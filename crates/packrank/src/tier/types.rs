//! Data structures for tier progression.

use serde::{Deserialize, Serialize};

use crate::ledger::UserId;

// ---------------------------------------------------------------------------
// Tier ladder
// ---------------------------------------------------------------------------

/// A named reputation bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
            Self::Diamond => "diamond",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Thresholds and benefits for one rung of the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub tier: Tier,
    /// Lifetime tier points needed.
    pub min_points: u64,
    /// Points that must be earned in the current calendar month to hold the tier.
    pub monthly_points_required: u64,
    pub benefits: Vec<String>,
}

impl TierDefinition {
    fn new(tier: Tier, min_points: u64, monthly: u64, benefits: &[&str]) -> Self {
        Self {
            tier,
            min_points,
            monthly_points_required: monthly,
            benefits: benefits.iter().map(|b| b.to_string()).collect(),
        }
    }
}

/// The built-in ladder: bronze, silver, gold, platinum, diamond.
pub fn default_ladder() -> Vec<TierDefinition> {
    vec![
        TierDefinition::new(Tier::Bronze, 0, 0, &["community_badge"]),
        TierDefinition::new(Tier::Silver, 1_000, 50, &["profile_flair", "event_early_access"]),
        TierDefinition::new(
            Tier::Gold,
            5_000,
            150,
            &["priority_partner_booking", "answer_highlight"],
        ),
        TierDefinition::new(
            Tier::Platinum,
            15_000,
            300,
            &["partner_discounts", "expert_ama_access"],
        ),
        TierDefinition::new(
            Tier::Diamond,
            50_000,
            600,
            &["community_council_seat", "annual_meetup_invite"],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Per-user state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierHistoryEntry {
    pub tier: Tier,
    pub achieved_at: u64,
    pub points_at_achievement: u64,
}

/// A user's position on the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierState {
    pub user_id: UserId,
    pub current_tier: Tier,
    /// Lifetime points counted toward tiers. Never decreases.
    pub tier_points: u64,
    /// Points earned in `month`.
    pub monthly_tier_points: u64,
    /// `YYYY-MM` key the monthly counter belongs to.
    pub month: String,
    /// When `current_tier` was entered.
    pub tier_start: u64,
    pub history: Vec<TierHistoryEntry>,
    pub updated_at: u64,
}

/// A change of `current_tier`, upward or downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChange {
    pub from: Tier,
    pub to: Tier,
    pub at: u64,
}

impl TierChange {
    pub fn is_promotion(&self) -> bool {
        self.to > self.from
    }
}

// ---------------------------------------------------------------------------
// Status projection
// ---------------------------------------------------------------------------

/// Estimated time to the next tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum TierEta {
    Days(u64),
    /// No points earned in the trailing window, so no estimate exists.
    Unknown,
    TopTier,
}

/// Tier state plus its progression summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierStatus {
    pub state: TierState,
    pub next_tier: Option<Tier>,
    /// Progress toward `next_tier`, in [0, 100].
    pub progress_percentage: f64,
    pub points_to_next_tier: Option<u64>,
    pub average_daily_points: f64,
    pub eta: TierEta,
    /// Benefits of the current tier and every tier below it.
    pub benefits: Vec<String>,
}
