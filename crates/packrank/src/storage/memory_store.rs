//! In-memory `ReputationStore`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::achievement::{AchievementId, ChainId, ChainProgress, UserAchievementProgress};
use crate::error::{ReputationError, Result};
use crate::ledger::{PointTransaction, PointsAccount, UserId};
use crate::tier::TierState;

use super::ReputationStore;

#[derive(Default)]
struct State {
    ledgers: HashMap<UserId, Vec<PointTransaction>>,
    accounts: HashMap<UserId, PointsAccount>,
    tiers: HashMap<UserId, TierState>,
    achievements: HashMap<UserId, BTreeMap<AchievementId, UserAchievementProgress>>,
    chains: HashMap<UserId, BTreeMap<ChainId, ChainProgress>>,
}

/// Everything held in maps behind one lock. Lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| ReputationError::StorageError("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| ReputationError::StorageError("memory store lock poisoned".into()))
    }
}

impl ReputationStore for MemoryStore {
    fn append_transaction(&self, transaction: &PointTransaction) -> Result<()> {
        let mut state = self.write()?;
        let ledger = state.ledgers.entry(transaction.user_id.clone()).or_default();
        if transaction.sequence != ledger.len() as u64 {
            return Err(ReputationError::StorageError(format!(
                "transaction {} for {} is out of sequence (ledger has {})",
                transaction.sequence,
                transaction.user_id,
                ledger.len()
            )));
        }
        ledger.push(transaction.clone());
        Ok(())
    }

    fn transactions(&self, user: &UserId) -> Result<Vec<PointTransaction>> {
        Ok(self.read()?.ledgers.get(user).cloned().unwrap_or_default())
    }

    fn transaction_count(&self, user: &UserId) -> Result<u64> {
        Ok(self.read()?.ledgers.get(user).map_or(0, |l| l.len() as u64))
    }

    fn load_account(&self, user: &UserId) -> Result<Option<PointsAccount>> {
        Ok(self.read()?.accounts.get(user).cloned())
    }

    fn save_account(&self, account: &PointsAccount) -> Result<()> {
        self.write()?
            .accounts
            .insert(account.user_id.clone(), account.clone());
        Ok(())
    }

    fn load_tier_state(&self, user: &UserId) -> Result<Option<TierState>> {
        Ok(self.read()?.tiers.get(user).cloned())
    }

    fn save_tier_state(&self, state: &TierState) -> Result<()> {
        self.write()?
            .tiers
            .insert(state.user_id.clone(), state.clone());
        Ok(())
    }

    fn achievement_progress(&self, user: &UserId) -> Result<Vec<UserAchievementProgress>> {
        Ok(self
            .read()?
            .achievements
            .get(user)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    fn save_achievement_progress(&self, progress: &UserAchievementProgress) -> Result<()> {
        self.write()?
            .achievements
            .entry(progress.user_id.clone())
            .or_default()
            .insert(progress.achievement_id.clone(), progress.clone());
        Ok(())
    }

    fn chain_progress(&self, user: &UserId) -> Result<Vec<ChainProgress>> {
        Ok(self
            .read()?
            .chains
            .get(user)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    fn save_chain_progress(&self, progress: &ChainProgress) -> Result<()> {
        self.write()?
            .chains
            .entry(progress.user_id.clone())
            .or_default()
            .insert(progress.chain_id.clone(), progress.clone());
        Ok(())
    }

    fn users(&self) -> Result<Vec<UserId>> {
        let mut users: Vec<UserId> = self.read()?.accounts.keys().cloned().collect();
        users.sort();
        Ok(users)
    }
}
