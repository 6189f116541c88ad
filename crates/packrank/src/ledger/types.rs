//! Data structures for the points ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::achievement::AchievementId;
use crate::tier::TierChange;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Community member identifier, as issued by the surrounding platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Transaction kind and source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Earn,
    Spend,
}

impl TransactionKind {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Spend => "spend",
        }
    }
}

/// What caused a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointSource {
    Vote,
    Answer,
    BestAnswer,
    Question,
    /// A completed streak day. The fold advances `streak_count` from these.
    StreakDay { day: NaiveDate },
    Referral,
    EventAttendance,
    Achievement { id: AchievementId },
    Redemption { item: String },
    Adjustment,
    Custom { label: String },
}

impl PointSource {
    /// Stable tag used in hashes and queries.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Vote => "vote",
            Self::Answer => "answer",
            Self::BestAnswer => "best_answer",
            Self::Question => "question",
            Self::StreakDay { .. } => "streak_day",
            Self::Referral => "referral",
            Self::EventAttendance => "event_attendance",
            Self::Achievement { .. } => "achievement",
            Self::Redemption { .. } => "redemption",
            Self::Adjustment => "adjustment",
            Self::Custom { .. } => "custom",
        }
    }

    /// Tag plus the variant payload, for hashing.
    pub fn detail(&self) -> String {
        match self {
            Self::StreakDay { day } => format!("streak_day:{day}"),
            Self::Achievement { id } => format!("achievement:{}", id.0),
            Self::Redemption { item } => format!("redemption:{item}"),
            Self::Custom { label } => format!("custom:{label}"),
            other => other.as_tag().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Point transaction
// ---------------------------------------------------------------------------

/// One immutable ledger row.
///
/// `tx_hash` covers every other field plus `previous_hash`, so a user's log
/// forms a hash chain from sequence 0 upwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointTransaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub sequence: u64,
    pub amount: u64,
    pub kind: TransactionKind,
    pub source: PointSource,
    pub description: String,
    pub created_at: u64,
    pub previous_hash: Option<String>,
    pub tx_hash: String,
}

// ---------------------------------------------------------------------------
// Level curve
// ---------------------------------------------------------------------------

/// Position on the level curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    pub experience_points: u64,
    /// Experience earned since reaching `level`.
    pub into_level: u64,
    /// Experience still needed to reach `level + 1`.
    pub needed_for_next: u64,
}

/// Level for a given amount of experience.
///
/// Levels start at 1 and going from level n to n+1 costs `n * step`, so
/// level 2 is reached at `step`, level 3 at `3 * step`, level 4 at `6 * step`.
pub fn level_for_experience(experience_points: u64, step: u64) -> LevelInfo {
    let step = step.max(1);
    let mut level: u32 = 1;
    let mut remaining = experience_points;
    let mut cost = step;
    while remaining >= cost {
        remaining -= cost;
        level += 1;
        cost = step.saturating_mul(level as u64);
    }
    LevelInfo {
        level,
        experience_points,
        into_level: remaining,
        needed_for_next: cost - remaining,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
}

// ---------------------------------------------------------------------------
// Points account
// ---------------------------------------------------------------------------

/// Cached fold of a user's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsAccount {
    pub user_id: UserId,
    pub balance: u64,
    pub earned_total: u64,
    pub spent_total: u64,
    pub lifetime_total: u64,
    pub level: u32,
    pub streak_count: u32,
    pub last_streak_day: Option<NaiveDate>,
    pub transaction_count: u64,
    pub last_transaction_hash: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl PointsAccount {
    /// Zeroed account.
    pub fn new(user_id: UserId, now: u64) -> Self {
        Self {
            user_id,
            balance: 0,
            earned_total: 0,
            spent_total: 0,
            lifetime_total: 0,
            level: 1,
            streak_count: 0,
            last_streak_day: None,
            transaction_count: 0,
            last_transaction_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Experience points drive the level curve. Spending never lowers them.
    pub fn experience_points(&self) -> u64 {
        self.earned_total
    }

    pub fn level_info(&self, step: u64) -> LevelInfo {
        level_for_experience(self.experience_points(), step)
    }

    /// Apply one transaction to the snapshot.
    pub fn apply(&mut self, tx: &PointTransaction, level_step: u64) {
        match tx.kind {
            TransactionKind::Earn => {
                self.earned_total = self.earned_total.saturating_add(tx.amount);
                self.lifetime_total = self.lifetime_total.saturating_add(tx.amount);
                if let PointSource::StreakDay { day } = &tx.source {
                    self.advance_streak(*day);
                }
            }
            TransactionKind::Spend => {
                self.spent_total = self.spent_total.saturating_add(tx.amount);
            }
        }
        self.balance = self.earned_total.saturating_sub(self.spent_total);
        self.level = level_for_experience(self.experience_points(), level_step).level;
        self.transaction_count = tx.sequence + 1;
        self.last_transaction_hash = Some(tx.tx_hash.clone());
        self.updated_at = tx.created_at;
    }

    fn advance_streak(&mut self, day: NaiveDate) {
        match self.last_streak_day {
            Some(last) if day <= last => {}
            Some(last) if last.succ_opt() == Some(day) => {
                self.streak_count += 1;
                self.last_streak_day = Some(day);
            }
            _ => {
                self.streak_count = 1;
                self.last_streak_day = Some(day);
            }
        }
    }

    /// Rebuild an account from its full log.
    pub fn fold(
        user_id: UserId,
        created_at: u64,
        transactions: &[PointTransaction],
        level_step: u64,
    ) -> Self {
        let mut account = Self::new(user_id, created_at);
        for tx in transactions {
            account.apply(tx, level_step);
        }
        account
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of `award_points` / `spend_points`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResult {
    pub transaction: PointTransaction,
    pub account: PointsAccount,
    pub level_up: Option<LevelUp>,
    pub tier_change: Option<TierChange>,
}

/// Ledger verification result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerVerification {
    pub user_id: UserId,
    pub transaction_count: u64,
    pub chain_valid: bool,
    pub snapshot_matches: bool,
    pub is_valid: bool,
    pub verified_at: u64,
    pub errors: Vec<String>,
}
