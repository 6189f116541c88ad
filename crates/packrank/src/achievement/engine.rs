//! Achievement engine: requirement checks, evaluation passes, listings.
//!
//! A pass is computed as a plan from a snapshot of the user's progress. The
//! caller persists the plan and pays rewards; nothing here does I/O.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{ReputationError, Result};
use crate::ledger::UserId;

use super::catalog::AchievementCatalog;
use super::stats::{StatValue, UserStats};
use super::types::*;

// ---------------------------------------------------------------------------
// Requirement checks
// ---------------------------------------------------------------------------

/// Result of testing one criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionCheck {
    pub satisfied: bool,
    /// Fraction of the threshold reached, in [0, 1].
    pub progress: f64,
    pub current: StatValue,
}

/// Compare a statistic against a threshold of the same shape.
///
/// Numbers pass at `>=`. Flags pass when the threshold is false or the stat
/// is true. Lists pass when the stat contains every required item. A
/// missing statistic or a shape mismatch is a malformed requirement.
pub fn check_criterion(
    achievement: &AchievementId,
    key: &str,
    threshold: &StatValue,
    stats: &UserStats,
) -> Result<CriterionCheck> {
    let malformed = |reason: String| ReputationError::MalformedRequirement {
        achievement: achievement.to_string(),
        key: key.to_string(),
        reason,
    };
    let current = stats
        .value(key)
        .ok_or_else(|| malformed("no such statistic".to_string()))?;

    let (satisfied, progress) = match (threshold, &current) {
        (StatValue::Number(t), StatValue::Number(v)) => {
            if !t.is_finite() || !v.is_finite() {
                return Err(malformed("non-finite number".to_string()));
            }
            let progress = if *t <= 0.0 { 1.0 } else { (v / t).clamp(0.0, 1.0) };
            (v >= t, progress)
        }
        (StatValue::Flag(t), StatValue::Flag(v)) => {
            let ok = !t || *v;
            (ok, if ok { 1.0 } else { 0.0 })
        }
        (StatValue::List(required), StatValue::List(have)) => {
            if required.is_empty() {
                (true, 1.0)
            } else {
                let present = required.iter().filter(|r| have.contains(r)).count();
                (present == required.len(), present as f64 / required.len() as f64)
            }
        }
        (t, v) => {
            return Err(malformed(format!("threshold {t} cannot be compared to {v}")));
        }
    };

    Ok(CriterionCheck {
        satisfied,
        progress,
        current,
    })
}

/// Outcome of testing every criterion of one achievement.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementCheck {
    pub satisfied: bool,
    /// Mean criterion progress, in [0, 1].
    pub progress: f64,
    pub current_values: BTreeMap<String, StatValue>,
}

/// Evaluate an achievement's own requirements.
///
/// Dependencies are not checked here. Malformed criteria are logged and
/// count as unsatisfied with zero progress.
pub fn check_requirements(
    catalog: &AchievementCatalog,
    definition: &AchievementDefinition,
    stats: &UserStats,
    now: u64,
) -> RequirementCheck {
    let in_window = definition
        .requirements
        .timeframe
        .map_or(true, |tf| tf.contains(now));

    if definition.is_hidden {
        let Some(predicate) = catalog.predicate(&definition.id) else {
            log::warn!("hidden achievement {} has no predicate", definition.id);
            return RequirementCheck {
                satisfied: false,
                progress: 0.0,
                current_values: BTreeMap::new(),
            };
        };
        let hidden = predicate(stats);
        return RequirementCheck {
            satisfied: in_window && hidden.is_met(),
            progress: hidden.fraction(),
            current_values: BTreeMap::new(),
        };
    }

    let criteria = &definition.requirements.criteria;
    let mut satisfied = in_window;
    let mut total = 0.0;
    let mut current_values = BTreeMap::new();

    for (key, threshold) in criteria {
        match check_criterion(&definition.id, key, threshold, stats) {
            Ok(check) => {
                satisfied &= check.satisfied;
                total += check.progress;
                current_values.insert(key.clone(), check.current);
            }
            Err(e) => {
                log::warn!("{e}");
                satisfied = false;
            }
        }
    }

    let progress = if criteria.is_empty() {
        1.0
    } else {
        total / criteria.len() as f64
    };

    RequirementCheck {
        satisfied,
        progress,
        current_values,
    }
}

// ---------------------------------------------------------------------------
// Evaluation pass
// ---------------------------------------------------------------------------

/// Inputs to a single evaluation pass.
pub struct PassInput<'a> {
    pub user_id: &'a UserId,
    pub catalog: &'a AchievementCatalog,
    pub stats: &'a UserStats,
    pub progress: &'a HashMap<AchievementId, UserAchievementProgress>,
    pub chains: &'a HashMap<ChainId, ChainProgress>,
    pub now: u64,
}

/// One unlock decided by a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUnlock {
    pub definition: AchievementDefinition,
    pub progress: UserAchievementProgress,
    pub chain: Option<ChainProgress>,
}

/// Writes a pass wants to make, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassPlan {
    pub unlocks: Vec<PlannedUnlock>,
    /// Changed progress rows that do not unlock anything.
    pub progress_updates: Vec<UserAchievementProgress>,
    /// Chain rows that changed without a level being unlocked.
    pub chain_updates: Vec<ChainProgress>,
}

impl PassPlan {
    pub fn is_empty(&self) -> bool {
        self.unlocks.is_empty() && self.progress_updates.is_empty() && self.chain_updates.is_empty()
    }
}

/// Dependencies are judged against what was unlocked before the pass began,
/// so an unlock never enables another unlock in the same pass.
fn dependencies_met(
    catalog: &AchievementCatalog,
    definition: &AchievementDefinition,
    unlocked: &HashSet<AchievementId>,
) -> bool {
    definition.requirements.dependencies.iter().all(|dep| {
        if !catalog.contains(dep) {
            log::warn!(
                "{}",
                ReputationError::UnknownAchievement(format!("{dep} (required by {})", definition.id))
            );
            return false;
        }
        unlocked.contains(dep)
    })
}

/// Evaluate one achievement and return its updated progress row plus
/// whether it unlocks now.
fn evaluate_one(
    input: &PassInput<'_>,
    definition: &AchievementDefinition,
    unlocked: &HashSet<AchievementId>,
) -> (UserAchievementProgress, bool, bool) {
    let previous = input.progress.get(&definition.id);
    let mut row = previous
        .cloned()
        .unwrap_or_else(|| UserAchievementProgress::new(input.user_id.clone(), definition));

    let check = check_requirements(input.catalog, definition, input.stats, input.now);
    let deps_ok = dependencies_met(input.catalog, definition, unlocked);

    row.progress_percentage = (check.progress * 100.0).clamp(0.0, 100.0);
    row.current_values = check.current_values;

    let unlocks = deps_ok && check.satisfied;
    if unlocks {
        row.progress_percentage = 100.0;
        row.unlocked_at = Some(input.now);
        if !row.is_discovered {
            row.is_discovered = true;
            row.discovered_at = Some(input.now);
        }
    }
    let changed = previous != Some(&row);
    (row, unlocks, changed)
}

/// Decide what one evaluation pass unlocks.
///
/// Standalone achievements are visited in id order, then each chain
/// advances by at most one level. Already-unlocked achievements are never
/// revisited.
pub fn plan_pass(input: &PassInput<'_>) -> PassPlan {
    let unlocked: HashSet<AchievementId> = input
        .progress
        .values()
        .filter(|p| p.is_unlocked())
        .map(|p| p.achievement_id.clone())
        .collect();

    let mut plan = PassPlan::default();

    for definition in input.catalog.standalone() {
        if unlocked.contains(&definition.id) {
            continue;
        }
        let (row, unlocks, changed) = evaluate_one(input, definition, &unlocked);
        if unlocks {
            plan.unlocks.push(PlannedUnlock {
                definition: definition.clone(),
                progress: row,
                chain: None,
            });
        } else if changed {
            plan.progress_updates.push(row);
        }
    }

    for chain in input.catalog.chains() {
        let previous = input.chains.get(&chain.id);
        let mut chain_row = previous
            .cloned()
            .unwrap_or_else(|| ChainProgress::new(input.user_id.clone(), chain.id.clone()));

        if chain_row.current_level >= chain.total_levels {
            continue;
        }
        let next_level = chain_row.current_level + 1;
        let Some(definition) = chain.level(next_level) else {
            continue;
        };

        // Level row unlocked but the chain row lagged behind; catch up
        // without paying again.
        if unlocked.contains(&definition.id) {
            log::warn!(
                "{}: chain {} catching up to level {}",
                input.user_id,
                chain.id,
                next_level
            );
            chain_row.current_level = next_level;
            if next_level == chain.total_levels {
                chain_row.completed_at = Some(input.now);
            }
            plan.chain_updates.push(chain_row);
            continue;
        }

        let (row, unlocks, changed) = evaluate_one(input, definition, &unlocked);
        chain_row.progress_data = row.current_values.clone();

        if unlocks {
            chain_row.current_level = next_level;
            if next_level == chain.total_levels {
                chain_row.completed_at = Some(input.now);
            }
            plan.unlocks.push(PlannedUnlock {
                definition: definition.clone(),
                progress: row,
                chain: Some(chain_row),
            });
        } else {
            if changed {
                plan.progress_updates.push(row);
            }
            if previous != Some(&chain_row) {
                plan.chain_updates.push(chain_row);
            }
        }
    }

    plan
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

fn view(definition: &AchievementDefinition, row: Option<&UserAchievementProgress>) -> AchievementView {
    AchievementView {
        id: definition.id.clone(),
        name: definition.name.clone(),
        description: definition.description.clone(),
        category: definition.category,
        rarity: definition.rarity,
        points: definition.rewards.points,
        chain_id: definition.chain_id.clone(),
        level: definition.level,
        progress_percentage: row.map(|r| r.progress_percentage).unwrap_or(0.0),
        unlocked_at: row.and_then(|r| r.unlocked_at),
        is_hidden: definition.is_hidden,
    }
}

const MASKED_NAME: &str = "Hidden achievement";
const MASKED_DESCRIPTION: &str = "Keep exploring the community to discover this one.";
const MASKED_ID_PREFIX: &str = "hidden_";

/// A locked hidden achievement with nothing that identifies it: a
/// positional placeholder id, no reward, no chain or level.
fn masked_view(
    definition: &AchievementDefinition,
    row: Option<&UserAchievementProgress>,
    position: usize,
) -> AchievementView {
    AchievementView {
        id: AchievementId::new(format!("{MASKED_ID_PREFIX}{position}")),
        name: MASKED_NAME.to_string(),
        description: MASKED_DESCRIPTION.to_string(),
        category: definition.category,
        rarity: definition.rarity,
        points: 0,
        chain_id: None,
        level: None,
        progress_percentage: row.map(|r| r.progress_percentage).unwrap_or(0.0),
        unlocked_at: None,
        is_hidden: true,
    }
}

/// Project stored progress into what a user may see.
///
/// Locked hidden achievements never appear by name; with `include_hidden`
/// they are listed masked by `masked_view`. Hints are offered for undiscovered hidden
/// achievements whose stored progress has reached `hint_threshold`.
pub fn list_achievements(
    catalog: &AchievementCatalog,
    progress: &HashMap<AchievementId, UserAchievementProgress>,
    options: ListOptions,
    hint_threshold: f64,
) -> AchievementListing {
    let mut listing = AchievementListing::default();
    let mut masked_count = 0usize;

    for definition in catalog.definitions() {
        let row = progress.get(&definition.id);
        let unlocked = row.is_some_and(|r| r.is_unlocked());

        if unlocked {
            listing.unlocked.push(view(definition, row));
            continue;
        }

        if !definition.is_hidden {
            if options.include_locked {
                listing.locked_visible.push(view(definition, row));
            }
            continue;
        }

        if options.include_locked && options.include_hidden {
            masked_count += 1;
            listing
                .locked_visible
                .push(masked_view(definition, row, masked_count));
        }

        let pct = row.map(|r| r.progress_percentage).unwrap_or(0.0);
        let discovered = row.is_some_and(|r| r.is_discovered);
        if let (Some(hint), false) = (&definition.discovery_hint, discovered) {
            if pct >= hint_threshold * 100.0 {
                listing.hints.push(DiscoveryHint {
                    hint: hint.clone(),
                    category: definition.category,
                    rarity: definition.rarity,
                    progress_percentage: pct,
                });
            }
        }
    }

    listing
        .unlocked
        .sort_by_key(|v| (v.unlocked_at, v.id.clone()));
    listing
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
