//! Transaction history queries.
//!
//! Filters are combined with logical AND, then results are sorted and an
//! optional limit applied.

use serde::{Deserialize, Serialize};

use super::types::{PointTransaction, TransactionKind};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Most recent transaction first.
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Query parameters for a user's transaction history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub kind: Option<TransactionKind>,
    /// Source tag as returned by `PointSource::as_tag` (e.g. `"achievement"`).
    pub source: Option<String>,
    /// Inclusive `[from, to]` range over `created_at`.
    pub time_range: Option<(u64, u64)>,
    pub limit: Option<usize>,
    pub order: SortOrder,
}

impl TransactionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn source(mut self, tag: impl Into<String>) -> Self {
        self.source = Some(tag.into());
        self
    }

    pub fn between(mut self, from: u64, to: u64) -> Self {
        self.time_range = Some((from, to));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    fn matches(&self, tx: &PointTransaction) -> bool {
        if let Some(kind) = self.kind {
            if tx.kind != kind {
                return false;
            }
        }
        if let Some(tag) = &self.source {
            if tx.source.as_tag() != tag {
                return false;
            }
        }
        if let Some((from, to)) = self.time_range {
            if tx.created_at < from || tx.created_at > to {
                return false;
            }
        }
        true
    }
}

/// Run a query over a user's log (any order).
pub fn query_transactions(
    transactions: Vec<PointTransaction>,
    query: &TransactionQuery,
) -> Vec<PointTransaction> {
    let mut results: Vec<PointTransaction> =
        transactions.into_iter().filter(|tx| query.matches(tx)).collect();

    match query.order {
        SortOrder::NewestFirst => results.sort_by(|a, b| b.sequence.cmp(&a.sequence)),
        SortOrder::OldestFirst => results.sort_by(|a, b| a.sequence.cmp(&b.sequence)),
    }

    if let Some(limit) = query.limit {
        results.truncate(limit);
    }
    results
}

/// Total earned in `[from, to]`.
pub fn earned_between(transactions: &[PointTransaction], from: u64, to: u64) -> u64 {
    transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Earn && tx.created_at >= from && tx.created_at <= to)
        .map(|tx| tx.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievement::AchievementId;
    use crate::ledger::engine::seal_transaction;
    use crate::ledger::types::{PointSource, PointsAccount, UserId};

    fn sample_log() -> Vec<PointTransaction> {
        let mut account = PointsAccount::new(UserId::from("q"), 0);
        let entries = vec![
            (10, TransactionKind::Earn, PointSource::Vote, 100),
            (25, TransactionKind::Earn, PointSource::BestAnswer, 200),
            (5, TransactionKind::Spend, PointSource::Redemption { item: "toy".into() }, 300),
            (
                50,
                TransactionKind::Earn,
                PointSource::Achievement {
                    id: AchievementId::new("first_answer"),
                },
                400,
            ),
        ];
        let mut log = Vec::new();
        for (amount, kind, source, at) in entries {
            let tx = seal_transaction(&account, amount, kind, source, "entry", at);
            account.apply(&tx, 100);
            log.push(tx);
        }
        log
    }

    #[test]
    fn test_default_query_newest_first() {
        let results = query_transactions(sample_log(), &TransactionQuery::new());
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].sequence, 3);
    }

    #[test]
    fn test_filter_by_kind_and_source() {
        let spends = query_transactions(sample_log(), &TransactionQuery::new().kind(TransactionKind::Spend));
        assert_eq!(spends.len(), 1);
        assert_eq!(spends[0].amount, 5);

        let achievements = query_transactions(sample_log(), &TransactionQuery::new().source("achievement"));
        assert_eq!(achievements.len(), 1);
        assert_eq!(achievements[0].amount, 50);
    }

    #[test]
    fn test_time_range_and_limit() {
        let results = query_transactions(
            sample_log(),
            &TransactionQuery::new()
                .between(150, 400)
                .order(SortOrder::OldestFirst)
                .limit(2),
        );
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].created_at, 200);
        assert_eq!(results[1].created_at, 300);
    }

    #[test]
    fn test_earned_between() {
        let log = sample_log();
        assert_eq!(earned_between(&log, 0, 1_000), 85);
        assert_eq!(earned_between(&log, 150, 350), 25);
    }
}
