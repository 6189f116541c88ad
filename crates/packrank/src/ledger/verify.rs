//! Ledger verification.
//!
//! Walks a user's log from sequence 0, checking sequence continuity, the
//! `previous_hash` links and every recomputed `tx_hash`, then compares the
//! fold of the log with the cached snapshot.

use super::engine::{compute_tx_hash, transaction_id};
use super::types::*;

/// Verify a user's ledger (ordered oldest first) against an optional snapshot.
pub fn verify_ledger(
    user_id: &UserId,
    transactions: &[PointTransaction],
    snapshot: Option<&PointsAccount>,
    level_step: u64,
    now: u64,
) -> LedgerVerification {
    let mut errors = Vec::new();
    let mut previous: Option<&str> = None;

    for (index, tx) in transactions.iter().enumerate() {
        if &tx.user_id != user_id {
            errors.push(format!("{} belongs to {}", tx.id, tx.user_id));
        }
        if tx.sequence != index as u64 {
            errors.push(format!(
                "{} has sequence {}, expected {}",
                tx.id, tx.sequence, index
            ));
        }
        if tx.previous_hash.as_deref() != previous {
            errors.push(format!("{} does not link to its predecessor", tx.id));
        }
        let expected = compute_tx_hash(
            &tx.user_id,
            tx.sequence,
            tx.amount,
            tx.kind,
            &tx.source,
            &tx.description,
            tx.created_at,
            tx.previous_hash.as_deref(),
        );
        if expected != tx.tx_hash || transaction_id(&tx.tx_hash) != tx.id {
            errors.push(format!("{} content does not match its hash", tx.id));
        }
        previous = Some(tx.tx_hash.as_str());
    }
    let chain_valid = errors.is_empty();

    let snapshot_matches = match snapshot {
        Some(account) => {
            let folded = PointsAccount::fold(
                user_id.clone(),
                account.created_at,
                transactions,
                level_step,
            );
            let matches = folded.balance == account.balance
                && folded.earned_total == account.earned_total
                && folded.spent_total == account.spent_total
                && folded.lifetime_total == account.lifetime_total
                && folded.level == account.level
                && folded.streak_count == account.streak_count
                && folded.transaction_count == account.transaction_count;
            if !matches {
                errors.push(format!(
                    "snapshot balance {} differs from ledger fold {}",
                    account.balance, folded.balance
                ));
            }
            matches
        }
        None => transactions.is_empty(),
    };

    LedgerVerification {
        user_id: user_id.clone(),
        transaction_count: transactions.len() as u64,
        chain_valid,
        snapshot_matches,
        is_valid: chain_valid && snapshot_matches,
        verified_at: now,
        errors,
    }
}
