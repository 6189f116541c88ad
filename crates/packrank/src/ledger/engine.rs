//! Ledger engine: sealing transactions and applying them to accounts.
//!
//! These functions assume the caller holds the user's lock. The engine
//! facade in [`crate::engine`] is the only public path that mutates a
//! ledger.

use sha2::{Digest, Sha256};

use crate::error::{ReputationError, Result};
use crate::storage::ReputationStore;

use super::types::*;

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Hash over every content field of a transaction and its predecessor link.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compute_tx_hash(
    user_id: &UserId,
    sequence: u64,
    amount: u64,
    kind: TransactionKind,
    source: &PointSource,
    description: &str,
    created_at: u64,
    previous_hash: Option<&str>,
) -> String {
    let hash_input = format!(
        "ptx:{}:{}:{}:{}:{}:{}:{}:{}",
        user_id.0,
        sequence,
        amount,
        kind.as_tag(),
        source.detail(),
        description,
        created_at,
        previous_hash.unwrap_or("genesis"),
    );
    hex::encode(Sha256::digest(hash_input.as_bytes()))
}

/// Derive the transaction ID from its hash.
pub(crate) fn transaction_id(tx_hash: &str) -> TransactionId {
    let id_hash = Sha256::digest(tx_hash.as_bytes());
    let id_encoded = bs58::encode(&id_hash[..16]).into_string();
    TransactionId(format!("ptx_{id_encoded}"))
}

/// Build the next transaction in an account's chain.
pub fn seal_transaction(
    account: &PointsAccount,
    amount: u64,
    kind: TransactionKind,
    source: PointSource,
    description: impl Into<String>,
    created_at: u64,
) -> PointTransaction {
    let description = description.into();
    let sequence = account.transaction_count;
    let previous_hash = account.last_transaction_hash.clone();
    let tx_hash = compute_tx_hash(
        &account.user_id,
        sequence,
        amount,
        kind,
        &source,
        &description,
        created_at,
        previous_hash.as_deref(),
    );

    PointTransaction {
        id: transaction_id(&tx_hash),
        user_id: account.user_id.clone(),
        sequence,
        amount,
        kind,
        source,
        description,
        created_at,
        previous_hash,
        tx_hash,
    }
}

// ---------------------------------------------------------------------------
// Account loading
// ---------------------------------------------------------------------------

/// Load a user's account, creating a zeroed one on first use.
///
/// If the cached snapshot lags the log (a crash between appending a row and
/// saving the snapshot), the snapshot is rebuilt from the log.
pub(crate) fn load_or_create_account(
    store: &dyn ReputationStore,
    user: &UserId,
    now: u64,
    level_step: u64,
) -> Result<PointsAccount> {
    let logged = store.transaction_count(user)?;
    match store.load_account(user)? {
        Some(account) if account.transaction_count == logged => Ok(account),
        Some(stale) => {
            log::warn!(
                "account snapshot for {} covers {} of {} transactions; rebuilding",
                user,
                stale.transaction_count,
                logged
            );
            let transactions = store.transactions(user)?;
            let account = PointsAccount::fold(
                user.clone(),
                stale.created_at,
                &transactions,
                level_step,
            );
            store.save_account(&account)?;
            Ok(account)
        }
        None if logged > 0 => {
            let transactions = store.transactions(user)?;
            let created_at = transactions.first().map(|t| t.created_at).unwrap_or(now);
            let account = PointsAccount::fold(user.clone(), created_at, &transactions, level_step);
            store.save_account(&account)?;
            Ok(account)
        }
        None => {
            let account = PointsAccount::new(user.clone(), now);
            store.save_account(&account)?;
            Ok(account)
        }
    }
}

// ---------------------------------------------------------------------------
// Append
// ---------------------------------------------------------------------------

/// A committed ledger write.
#[derive(Debug, Clone)]
pub(crate) struct Committed {
    pub transaction: PointTransaction,
    pub account: PointsAccount,
    pub level_up: Option<LevelUp>,
}

/// Append one transaction and update the snapshot.
///
/// Spends that exceed the balance fail before anything is written.
#[allow(clippy::too_many_arguments)]
pub(crate) fn append(
    store: &dyn ReputationStore,
    user: &UserId,
    amount: u64,
    kind: TransactionKind,
    source: PointSource,
    description: &str,
    now: u64,
    level_step: u64,
) -> Result<Committed> {
    if amount == 0 {
        return Err(ReputationError::InvalidAmount(amount));
    }

    let mut account = load_or_create_account(store, user, now, level_step)?;

    if kind == TransactionKind::Spend && account.balance < amount {
        return Err(ReputationError::InsufficientBalance {
            user: user.0.clone(),
            requested: amount,
            available: account.balance,
        });
    }

    let transaction = seal_transaction(&account, amount, kind, source, description, now);
    store.append_transaction(&transaction)?;

    let level_before = account.level;
    account.apply(&transaction, level_step);
    store.save_account(&account)?;

    let level_up = (account.level > level_before).then_some(LevelUp {
        from: level_before,
        to: account.level,
    });

    log::debug!(
        "{} {} {} points for {} (balance {})",
        transaction.id,
        kind.as_tag(),
        amount,
        user,
        account.balance
    );

    Ok(Committed {
        transaction,
        account,
        level_up,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
