//! The reputation engine: the library boundary.
//!
//! Every mutating call takes the user's lock from a lock arena, so writes
//! for one user are serialized while unrelated users never contend. Inside
//! the lock the ledger commits first, then tier points are applied, then
//! achievements are evaluated and their rewards paid.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::achievement::{
    self, default_catalog, AchievementCatalog, AchievementId, AchievementListing, ListOptions,
    PassInput, UnlockedAchievement, UserStats,
};
use crate::activity::ActivityEvent;
use crate::config::EngineConfig;
use crate::error::{ReputationError, Result};
use crate::ledger::engine::{append, load_or_create_account};
use crate::ledger::{
    self, LedgerVerification, LevelUp, PointSource, PointTransaction, PointsAccount,
    TransactionKind, TransactionQuery, TransactionResult, UserId,
};
use crate::quality::{self, QualityScore, ScoreRequest};
use crate::storage::{MemoryStore, ReputationStore};
use crate::tier::{self, TierChange, TierState, TierStatus};
use crate::time::{Clock, SystemClock};

/// What one evaluation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub level_ups: Vec<LevelUp>,
    /// Visible achievements unlocked by this pass.
    pub newly_unlocked: Vec<UnlockedAchievement>,
    /// Hidden achievements unlocked (and so discovered) by this pass.
    pub discovered_hidden: Vec<UnlockedAchievement>,
    pub tier_change: Option<TierChange>,
}

impl EvaluationOutcome {
    pub fn is_empty(&self) -> bool {
        self.level_ups.is_empty()
            && self.newly_unlocked.is_empty()
            && self.discovered_hidden.is_empty()
            && self.tier_change.is_none()
    }
}

/// Result of recording one activity event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityOutcome {
    /// The activity's own award; `None` when the schedule pays nothing.
    pub transaction: Option<TransactionResult>,
    pub evaluation: EvaluationOutcome,
}

pub struct ReputationEngine {
    store: Arc<dyn ReputationStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    catalog: Arc<AchievementCatalog>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl ReputationEngine {
    /// Engine over `store` with the system clock and the default catalog.
    ///
    /// # Errors
    ///
    /// Returns `ReputationError::InvalidConfig` if `config` fails validation.
    pub fn new(store: Arc<dyn ReputationStore>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            clock: Arc::new(SystemClock),
            config,
            catalog: default_catalog(),
            locks: DashMap::new(),
        })
    }

    /// Engine over a fresh [`MemoryStore`] with default configuration.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
            catalog: default_catalog(),
            locks: DashMap::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<AchievementCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &dyn ReputationStore {
        self.store.as_ref()
    }

    // -----------------------------------------------------------------------
    // Locking
    // -----------------------------------------------------------------------

    fn with_user<T>(&self, user: &UserId, f: impl FnOnce() -> T) -> T {
        let lock = self
            .locks
            .entry(user.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            // The guarded value is unit, so a poisoned lock carries no state.
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);
        // Only the map's own handle left means no caller holds or awaits it.
        self.locks
            .remove_if(user, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    // -----------------------------------------------------------------------
    // Points
    // -----------------------------------------------------------------------

    /// Append an earn transaction and count it toward tiers.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for zero, `InvalidUserId`, or any storage error.
    pub fn award_points(
        &self,
        user: &UserId,
        amount: u64,
        source: PointSource,
        description: &str,
    ) -> Result<TransactionResult> {
        validate_user(user)?;
        let now = self.clock.now_micros();
        self.with_user(user, || self.award_locked(user, amount, source, description, now))
    }

    /// Append a spend transaction. Tiers are unaffected.
    ///
    /// # Errors
    ///
    /// `InsufficientBalance` when `amount` exceeds the balance; nothing is
    /// written in that case.
    pub fn spend_points(
        &self,
        user: &UserId,
        amount: u64,
        source: PointSource,
        description: &str,
    ) -> Result<TransactionResult> {
        validate_user(user)?;
        let now = self.clock.now_micros();
        self.with_user(user, || {
            let committed = append(
                self.store.as_ref(),
                user,
                amount,
                TransactionKind::Spend,
                source,
                description,
                now,
                self.config.level_step,
            )?;
            Ok(TransactionResult {
                transaction: committed.transaction,
                account: committed.account,
                level_up: None,
                tier_change: None,
            })
        })
    }

    /// The user's account, created zeroed on first use.
    pub fn get_points_snapshot(&self, user: &UserId) -> Result<PointsAccount> {
        validate_user(user)?;
        let now = self.clock.now_micros();
        self.with_user(user, || {
            load_or_create_account(self.store.as_ref(), user, now, self.config.level_step)
        })
    }

    pub fn transaction_history(
        &self,
        user: &UserId,
        query: &TransactionQuery,
    ) -> Result<Vec<PointTransaction>> {
        validate_user(user)?;
        Ok(ledger::query_transactions(self.store.transactions(user)?, query))
    }

    /// Check the user's hash chain and cached snapshot.
    pub fn verify_ledger(&self, user: &UserId) -> Result<LedgerVerification> {
        validate_user(user)?;
        let now = self.clock.now_micros();
        self.with_user(user, || {
            let transactions = self.store.transactions(user)?;
            let snapshot = self.store.load_account(user)?;
            Ok(ledger::verify_ledger(
                user,
                &transactions,
                snapshot.as_ref(),
                self.config.level_step,
                now,
            ))
        })
    }

    pub fn users(&self) -> Result<Vec<UserId>> {
        self.store.users()
    }

    fn award_locked(
        &self,
        user: &UserId,
        amount: u64,
        source: PointSource,
        description: &str,
        now: u64,
    ) -> Result<TransactionResult> {
        let committed = append(
            self.store.as_ref(),
            user,
            amount,
            TransactionKind::Earn,
            source,
            description,
            now,
            self.config.level_step,
        )?;

        let tier_change = match self.apply_tier_points(user, amount, now) {
            Ok(change) => change,
            Err(e) => {
                log::error!("tier update for {user} after {} failed: {e}", committed.transaction.id);
                None
            }
        };

        Ok(TransactionResult {
            transaction: committed.transaction,
            account: committed.account,
            level_up: committed.level_up,
            tier_change,
        })
    }

    // -----------------------------------------------------------------------
    // Tiers
    // -----------------------------------------------------------------------

    /// Stored tier state with any pending monthly reset applied (not saved).
    fn load_tier(&self, user: &UserId, now: u64) -> Result<(Option<TierState>, TierState)> {
        let stored = self.store.load_tier_state(user)?;
        let mut state = stored
            .clone()
            .unwrap_or_else(|| tier::new_state(user.clone(), &self.config.tiers, now));
        tier::roll_month(&mut state, &self.config.tiers, now);
        Ok((stored, state))
    }

    fn apply_tier_points(&self, user: &UserId, delta: u64, now: u64) -> Result<Option<TierChange>> {
        let (stored, mut state) = self.load_tier(user, now)?;
        let before = stored.as_ref().map_or(state.current_tier, |s| s.current_tier);
        tier::apply_points(&mut state, &self.config.tiers, delta, now);
        self.store.save_tier_state(&state)?;
        Ok((state.current_tier != before).then_some(TierChange {
            from: before,
            to: state.current_tier,
            at: now,
        }))
    }

    /// Tier state plus progress, ETA, and benefits.
    pub fn get_tier_status(&self, user: &UserId) -> Result<TierStatus> {
        validate_user(user)?;
        let now = self.clock.now_micros();
        self.with_user(user, || {
            let (stored, state) = self.load_tier(user, now)?;
            if stored.as_ref() != Some(&state) {
                self.store.save_tier_state(&state)?;
            }
            let transactions = self.store.transactions(user)?;
            Ok(tier::tier_status(
                &state,
                &self.config.tiers,
                &transactions,
                now,
                self.config.trailing_window_days,
            ))
        })
    }

    // -----------------------------------------------------------------------
    // Achievements
    // -----------------------------------------------------------------------

    /// What the user may see of their achievements. Read-only.
    pub fn list_achievements(&self, user: &UserId, options: ListOptions) -> Result<AchievementListing> {
        validate_user(user)?;
        let progress: HashMap<_, _> = self
            .store
            .achievement_progress(user)?
            .into_iter()
            .map(|p| (p.achievement_id.clone(), p))
            .collect();
        Ok(achievement::list_achievements(
            &self.catalog,
            &progress,
            options,
            self.config.hint_threshold,
        ))
    }

    /// Run one achievement pass and pay its rewards.
    ///
    /// Never fails: errors are logged and yield an empty outcome.
    pub fn evaluate_activity(&self, user: &UserId, stats: &UserStats) -> EvaluationOutcome {
        if let Err(e) = validate_user(user) {
            log::warn!("skipping evaluation: {e}");
            return EvaluationOutcome::default();
        }
        let now = self.clock.now_micros();
        self.with_user(user, || self.evaluate_contained(user, stats, now))
    }

    /// Award the points an event earns, then evaluate achievements.
    ///
    /// # Errors
    ///
    /// Only the event's own award can fail; evaluation errors are contained.
    pub fn record_activity(
        &self,
        user: &UserId,
        event: &ActivityEvent,
        stats: &UserStats,
    ) -> Result<ActivityOutcome> {
        validate_user(user)?;
        let now = self.clock.now_micros();
        self.with_user(user, || {
            let transaction = match event.reward(&self.config.points) {
                Some(reward) => Some(self.award_locked(
                    user,
                    reward.amount,
                    reward.source,
                    &reward.description,
                    now,
                )?),
                None => None,
            };
            let evaluation = self.evaluate_contained(user, stats, now);
            Ok(ActivityOutcome {
                transaction,
                evaluation,
            })
        })
    }

    fn evaluate_contained(&self, user: &UserId, stats: &UserStats, now: u64) -> EvaluationOutcome {
        match self.evaluate_locked(user, stats, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("achievement evaluation for {user} failed: {e}");
                EvaluationOutcome::default()
            }
        }
    }

    fn evaluate_locked(&self, user: &UserId, stats: &UserStats, now: u64) -> Result<EvaluationOutcome> {
        let store = self.store.as_ref();
        let ladder = &self.config.tiers;
        let mut outcome = EvaluationOutcome::default();

        let account = load_or_create_account(store, user, now, self.config.level_step)?;
        let (stored_tier, mut tier_state) = self.load_tier(user, now)?;
        let tier_before = stored_tier
            .as_ref()
            .map_or(tier_state.current_tier, |s| s.current_tier);

        // Rows left behind by catalog entries that no longer exist take no
        // part in the pass and are not counted as unlocks.
        let progress: HashMap<_, _> = store
            .achievement_progress(user)?
            .into_iter()
            .filter(|p| {
                let known = self.catalog.contains(&p.achievement_id);
                if !known {
                    let err = ReputationError::UnknownAchievement(p.achievement_id.to_string());
                    log::warn!("ignoring stored progress for {user}: {err}");
                }
                known
            })
            .map(|p| (p.achievement_id.clone(), p))
            .collect();
        let chains: HashMap<_, _> = store
            .chain_progress(user)?
            .into_iter()
            .filter(|c| {
                let known = self.catalog.chain(&c.chain_id).is_some();
                if !known {
                    let err = ReputationError::UnknownChain(c.chain_id.to_string());
                    log::warn!("ignoring stored chain progress for {user}: {err}");
                }
                known
            })
            .map(|c| (c.chain_id.clone(), c))
            .collect();

        let mut stats = stats.clone();
        stats.achievements_unlocked = progress.values().filter(|p| p.is_unlocked()).count() as u32;
        stats.level = account.level;
        stats.lifetime_points = account.lifetime_total;
        stats.tier_rank = tier_state.current_tier.rank();
        stats.streak_days = stats.streak_days.max(account.streak_count);

        let plan = achievement::plan_pass(&PassInput {
            user_id: user,
            catalog: &self.catalog,
            stats: &stats,
            progress: &progress,
            chains: &chains,
            now,
        });

        // A reward already in the ledger means an earlier pass paid it but
        // stopped before saving the unlock.
        let already_paid: HashSet<AchievementId> = if plan.unlocks.is_empty() {
            HashSet::new()
        } else {
            store
                .transactions(user)?
                .into_iter()
                .filter_map(|tx| match tx.source {
                    PointSource::Achievement { id } => Some(id),
                    _ => None,
                })
                .collect()
        };

        for unlock in &plan.unlocks {
            let def = &unlock.definition;
            let mut transaction_id = None;
            let mut points_awarded = 0;

            if def.rewards.points > 0 && !already_paid.contains(&def.id) {
                let committed = append(
                    store,
                    user,
                    def.rewards.points,
                    TransactionKind::Earn,
                    PointSource::Achievement { id: def.id.clone() },
                    &format!("Achievement unlocked: {}", def.name),
                    now,
                    self.config.level_step,
                )?;
                outcome.level_ups.extend(committed.level_up);
                transaction_id = Some(committed.transaction.id);
                points_awarded = def.rewards.points;

                tier::apply_points(&mut tier_state, ladder, def.rewards.points, now);
                store.save_tier_state(&tier_state)?;
            }

            store.save_achievement_progress(&unlock.progress)?;
            if let Some(chain) = &unlock.chain {
                store.save_chain_progress(chain)?;
            }

            log::info!("{user} unlocked {} ({} points)", def.id, points_awarded);

            let unlocked = UnlockedAchievement {
                id: def.id.clone(),
                name: def.name.clone(),
                rarity: def.rarity,
                chain: unlock
                    .chain
                    .as_ref()
                    .map(|c| (c.chain_id.clone(), c.current_level)),
                points_awarded,
                badges: def.rewards.badges.clone(),
                perks: def.rewards.perks.clone(),
                unlocks: def.rewards.unlocks.clone(),
                unlocked_at: now,
                transaction_id,
            };
            if def.is_hidden {
                outcome.discovered_hidden.push(unlocked);
            } else {
                outcome.newly_unlocked.push(unlocked);
            }
        }

        for row in &plan.progress_updates {
            store.save_achievement_progress(row)?;
        }
        for chain in &plan.chain_updates {
            store.save_chain_progress(chain)?;
        }

        if stored_tier.as_ref() != Some(&tier_state) {
            store.save_tier_state(&tier_state)?;
        }
        outcome.tier_change = (tier_state.current_tier != tier_before).then_some(TierChange {
            from: tier_before,
            to: tier_state.current_tier,
            at: now,
        });

        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Quality
    // -----------------------------------------------------------------------

    /// Score an answer. Stateless; never fails.
    pub fn score_answer(&self, request: &ScoreRequest) -> QualityScore {
        quality::score_request(request)
    }
}

fn validate_user(user: &UserId) -> Result<()> {
    if user.as_str().trim().is_empty() {
        return Err(ReputationError::InvalidUserId(user.0.clone()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
