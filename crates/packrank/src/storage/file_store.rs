//! Filesystem `ReputationStore`: one versioned JSON file per record.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "record": { ... }
//! }
//! ```
//!
//! Ledger rows are created with `create_new`, so an existing row is never
//! overwritten. Snapshots are written to a temporary file and renamed into
//! place.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::achievement::{ChainProgress, UserAchievementProgress};
use crate::error::{ReputationError, Result};
use crate::ledger::{PointTransaction, PointsAccount, UserId};
use crate::tier::TierState;

use super::ReputationStore;

const RECORD_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RecordFile<T> {
    version: u32,
    record: T,
}

/// Directory-backed store rooted at `base_dir`.
///
/// Safe for one process; writers in separate processes are not coordinated.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create the store and its top-level directories.
    ///
    /// # Errors
    ///
    /// Returns `ReputationError::Io` if a directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        for sub in ["ledger", "accounts", "tiers", "achievements", "chains"] {
            std::fs::create_dir_all(base_dir.join(sub))?;
        }
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn ledger_dir(&self, user: &UserId) -> Result<PathBuf> {
        Ok(self.base_dir.join("ledger").join(safe_segment(user.as_str())?))
    }

    fn account_path(&self, user: &UserId) -> Result<PathBuf> {
        Ok(self
            .base_dir
            .join("accounts")
            .join(format!("{}.json", safe_segment(user.as_str())?)))
    }

    fn tier_path(&self, user: &UserId) -> Result<PathBuf> {
        Ok(self
            .base_dir
            .join("tiers")
            .join(format!("{}.json", safe_segment(user.as_str())?)))
    }

    fn user_dir(&self, kind: &str, user: &UserId) -> Result<PathBuf> {
        Ok(self.base_dir.join(kind).join(safe_segment(user.as_str())?))
    }
}

/// User and achievement ids become path segments; reject anything that
/// could escape the store directory.
fn safe_segment(id: &str) -> Result<&str> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'));
    if valid {
        Ok(id)
    } else {
        Err(ReputationError::InvalidUserId(id.to_string()))
    }
}

fn encode<T: Serialize>(record: &T) -> Result<String> {
    let file = RecordFile {
        version: RECORD_FILE_VERSION,
        record,
    };
    serde_json::to_string_pretty(&file).map_err(|e| ReputationError::SerializationError(e.to_string()))
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    let file: RecordFile<T> = serde_json::from_slice(&bytes).map_err(|e| {
        ReputationError::InvalidFileFormat(format!("failed to parse {}: {e}", path.display()))
    })?;
    if file.version != RECORD_FILE_VERSION {
        return Err(ReputationError::InvalidFileFormat(format!(
            "{} has unsupported version {}",
            path.display(),
            file.version
        )));
    }
    Ok(file.record)
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_record(path).map(Some)
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = encode(record)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// JSON files directly inside `dir`, sorted by name. Missing dir → empty.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    json_files(dir)?.iter().map(|p| read_record(p)).collect()
}

impl ReputationStore for FileStore {
    fn append_transaction(&self, transaction: &PointTransaction) -> Result<()> {
        use std::io::Write;

        let dir = self.ledger_dir(&transaction.user_id)?;
        std::fs::create_dir_all(&dir)?;

        let count = json_files(&dir)?.len() as u64;
        if transaction.sequence != count {
            return Err(ReputationError::StorageError(format!(
                "transaction {} for {} is out of sequence (ledger has {})",
                transaction.sequence, transaction.user_id, count
            )));
        }

        let path = dir.join(format!("{:010}.json", transaction.sequence));
        let json = encode(transaction)?;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => ReputationError::StorageError(format!(
                    "transaction {} already recorded for {}",
                    transaction.sequence, transaction.user_id
                )),
                _ => ReputationError::Io(e),
            })?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    fn transactions(&self, user: &UserId) -> Result<Vec<PointTransaction>> {
        let mut txs: Vec<PointTransaction> = read_all(&self.ledger_dir(user)?)?;
        txs.sort_by_key(|t| t.sequence);
        Ok(txs)
    }

    fn transaction_count(&self, user: &UserId) -> Result<u64> {
        Ok(json_files(&self.ledger_dir(user)?)?.len() as u64)
    }

    fn load_account(&self, user: &UserId) -> Result<Option<PointsAccount>> {
        read_optional(&self.account_path(user)?)
    }

    fn save_account(&self, account: &PointsAccount) -> Result<()> {
        write_record(&self.account_path(&account.user_id)?, account)
    }

    fn load_tier_state(&self, user: &UserId) -> Result<Option<TierState>> {
        read_optional(&self.tier_path(user)?)
    }

    fn save_tier_state(&self, state: &TierState) -> Result<()> {
        write_record(&self.tier_path(&state.user_id)?, state)
    }

    fn achievement_progress(&self, user: &UserId) -> Result<Vec<UserAchievementProgress>> {
        read_all(&self.user_dir("achievements", user)?)
    }

    fn save_achievement_progress(&self, progress: &UserAchievementProgress) -> Result<()> {
        let dir = self.user_dir("achievements", &progress.user_id)?;
        let name = safe_segment(&progress.achievement_id.0)?;
        write_record(&dir.join(format!("{name}.json")), progress)
    }

    fn chain_progress(&self, user: &UserId) -> Result<Vec<ChainProgress>> {
        read_all(&self.user_dir("chains", user)?)
    }

    fn save_chain_progress(&self, progress: &ChainProgress) -> Result<()> {
        let dir = self.user_dir("chains", &progress.user_id)?;
        let name = safe_segment(&progress.chain_id.0)?;
        write_record(&dir.join(format!("{name}.json")), progress)
    }

    fn users(&self) -> Result<Vec<UserId>> {
        let mut users: Vec<UserId> = json_files(&self.base_dir.join("accounts"))?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(UserId::from))
            .collect();
        users.sort();
        Ok(users)
    }
}
