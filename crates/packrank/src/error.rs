//! Error types for PackRank.
//!
//! Ledger failures are surfaced to callers as typed errors. Evaluation
//! passes (achievements, tiers, scoring) contain their own failures and
//! only use these variants for logging and diagnostics.

/// Reputation engine error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum ReputationError {
    #[error("Insufficient balance for {user}: requested {requested}, available {available}")]
    InsufficientBalance {
        user: String,
        requested: u64,
        available: u64,
    },

    #[error("Invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(u64),

    #[error("Unknown achievement: {0}")]
    UnknownAchievement(String),

    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Malformed requirement '{key}' on {achievement}: {reason}")]
    MalformedRequirement {
        achievement: String,
        key: String,
        reason: String,
    },

    #[error("Scoring failed: {0}")]
    ScoringFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, ReputationError>;
