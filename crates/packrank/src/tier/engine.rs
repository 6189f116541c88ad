//! Tier engine: threshold passes, monthly requalification, status.
//!
//! Everything here is a pure function of a `TierState`, the ladder, and a
//! timestamp. Persistence and locking live in the engine facade.

use crate::ledger::{earned_between, PointTransaction, UserId};
use crate::time::{month_key, MICROS_PER_DAY};

use super::types::*;

// ---------------------------------------------------------------------------
// Ladder lookups
// ---------------------------------------------------------------------------

/// Highest tier whose lifetime and monthly thresholds are both met.
pub fn qualifying_tier(ladder: &[TierDefinition], tier_points: u64, monthly_points: u64) -> Tier {
    ladder
        .iter()
        .rev()
        .find(|def| def.min_points <= tier_points && def.monthly_points_required <= monthly_points)
        .or_else(|| ladder.first())
        .map(|def| def.tier)
        .unwrap_or(Tier::Bronze)
}

fn position(ladder: &[TierDefinition], tier: Tier) -> Option<usize> {
    ladder.iter().position(|def| def.tier == tier)
}

// ---------------------------------------------------------------------------
// State transitions
// ---------------------------------------------------------------------------

/// Fresh state at the bottom of the ladder.
pub fn new_state(user_id: UserId, ladder: &[TierDefinition], now: u64) -> TierState {
    let tier = qualifying_tier(ladder, 0, 0);
    TierState {
        user_id,
        current_tier: tier,
        tier_points: 0,
        monthly_tier_points: 0,
        month: month_key(now),
        tier_start: now,
        history: vec![TierHistoryEntry {
            tier,
            achieved_at: now,
            points_at_achievement: 0,
        }],
        updated_at: now,
    }
}

/// Re-derive `current_tier` from the counters.
///
/// History only grows when the new tier outranks everything already in it,
/// so it stays monotonic when a tier is lost and later regained.
fn recompute(state: &mut TierState, ladder: &[TierDefinition], now: u64) {
    let tier = qualifying_tier(ladder, state.tier_points, state.monthly_tier_points);
    if tier == state.current_tier {
        return;
    }
    state.current_tier = tier;
    state.tier_start = now;

    let highest = state.history.iter().map(|h| h.tier).max();
    if highest.map_or(true, |h| tier > h) {
        state.history.push(TierHistoryEntry {
            tier,
            achieved_at: now,
            points_at_achievement: state.tier_points,
        });
    }
}

/// Reset the monthly counter when the calendar month has changed.
///
/// Returns the tier change caused by requalification, if any.
pub fn roll_month(state: &mut TierState, ladder: &[TierDefinition], now: u64) -> Option<TierChange> {
    let month = month_key(now);
    if month == state.month {
        return None;
    }
    let before = state.current_tier;
    state.month = month;
    state.monthly_tier_points = 0;
    recompute(state, ladder, now);
    state.updated_at = now;

    (state.current_tier != before).then(|| {
        log::info!(
            "{} requalified from {} to {} at month rollover",
            state.user_id,
            before,
            state.current_tier
        );
        TierChange {
            from: before,
            to: state.current_tier,
            at: now,
        }
    })
}

/// Count an award toward tiers.
pub fn apply_points(
    state: &mut TierState,
    ladder: &[TierDefinition],
    delta: u64,
    now: u64,
) -> Option<TierChange> {
    let before = state.current_tier;
    roll_month(state, ladder, now);

    state.tier_points = state.tier_points.saturating_add(delta);
    state.monthly_tier_points = state.monthly_tier_points.saturating_add(delta);
    recompute(state, ladder, now);
    state.updated_at = now;

    (state.current_tier != before).then(|| {
        log::info!("{} moved from {} to {}", state.user_id, before, state.current_tier);
        TierChange {
            from: before,
            to: state.current_tier,
            at: now,
        }
    })
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Progression summary for a state. `transactions` is the user's ledger,
/// used for the trailing earn rate.
pub fn tier_status(
    state: &TierState,
    ladder: &[TierDefinition],
    transactions: &[PointTransaction],
    now: u64,
    window_days: u32,
) -> TierStatus {
    let window_days = window_days.max(1);
    let window_start = now.saturating_sub(window_days as u64 * MICROS_PER_DAY);
    let earned_in_window = earned_between(transactions, window_start, now);
    let average_daily_points = earned_in_window as f64 / window_days as f64;

    let current_index = position(ladder, state.current_tier).unwrap_or(0);
    let current_min = ladder.get(current_index).map(|d| d.min_points).unwrap_or(0);

    let benefits = ladder
        .iter()
        .take(current_index + 1)
        .flat_map(|def| def.benefits.iter().cloned())
        .fold(Vec::new(), |mut acc: Vec<String>, b| {
            if !acc.contains(&b) {
                acc.push(b);
            }
            acc
        });

    let Some(next) = ladder.get(current_index + 1) else {
        return TierStatus {
            state: state.clone(),
            next_tier: None,
            progress_percentage: 100.0,
            points_to_next_tier: None,
            average_daily_points,
            eta: TierEta::TopTier,
            benefits,
        };
    };

    let span = next.min_points.saturating_sub(current_min).max(1) as f64;
    let progress_percentage =
        ((state.tier_points.saturating_sub(current_min)) as f64 / span * 100.0).clamp(0.0, 100.0);

    let remaining = next
        .min_points
        .saturating_sub(state.tier_points)
        .max(next.monthly_points_required.saturating_sub(state.monthly_tier_points));

    let eta = if remaining == 0 {
        TierEta::Days(0)
    } else if earned_in_window == 0 {
        TierEta::Unknown
    } else {
        // ceil(remaining / (earned / window)) in integers
        let scaled = remaining.saturating_mul(window_days as u64);
        TierEta::Days(scaled.div_ceil(earned_in_window))
    };

    TierStatus {
        state: state.clone(),
        next_tier: Some(next.tier),
        progress_percentage,
        points_to_next_tier: Some(remaining),
        average_daily_points,
        eta,
        benefits,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
