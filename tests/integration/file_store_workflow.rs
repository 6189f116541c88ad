//! Integration test: engine over the filesystem store.
//!
//! Covers persistence across engine restarts, snapshot rebuild after a
//! stale account file, tamper detection, and config file loading.

use std::sync::Arc;

use chrono::NaiveDate;

use packrank::time::date_to_micros;
use packrank::{
    EngineConfig, FileStore, ManualClock, PointSource, ReputationEngine, ReputationStore, Tier,
    UserId, UserStats,
};

fn open(dir: &std::path::Path, clock: &Arc<ManualClock>) -> ReputationEngine {
    let store = FileStore::new(dir).expect("store should open");
    ReputationEngine::new(Arc::new(store), EngineConfig::default())
        .expect("default config is valid")
        .with_clock(clock.clone())
}

fn may(day: u32) -> u64 {
    date_to_micros(NaiveDate::from_ymd_opt(2026, 5, day).unwrap())
}

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(may(3)));
    let user = UserId::from("juniper");

    {
        let engine = open(dir.path(), &clock);
        engine.award_points(&user, 1_100, PointSource::Adjustment, "import").unwrap();
        let stats = UserStats {
            answers_posted: 5,
            ..Default::default()
        };
        let outcome = engine.evaluate_activity(&user, &stats);
        assert_eq!(outcome.newly_unlocked.len(), 2);
    }

    clock.advance(1);
    let engine = open(dir.path(), &clock);
    let account = engine.get_points_snapshot(&user).unwrap();
    assert_eq!(account.balance, 1_100 + 10 + 15);
    assert_eq!(account.transaction_count, 3);

    let status = engine.get_tier_status(&user).unwrap();
    assert_eq!(status.state.current_tier, Tier::Silver);

    // Nothing unlocks twice after a restart.
    let stats = UserStats {
        answers_posted: 5,
        ..Default::default()
    };
    assert!(engine.evaluate_activity(&user, &stats).is_empty());
    assert_eq!(engine.users().unwrap(), vec![user]);
}

#[test]
fn stale_snapshot_is_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(may(3)));
    let user = UserId::from("juniper");
    let engine = open(dir.path(), &clock);

    engine.award_points(&user, 40, PointSource::Vote, "votes").unwrap();
    let stale = engine.store().load_account(&user).unwrap().unwrap();
    engine.award_points(&user, 60, PointSource::Vote, "votes").unwrap();

    // Simulate a crash between the ledger row and the snapshot write.
    engine.store().save_account(&stale).unwrap();

    let account = engine.get_points_snapshot(&user).unwrap();
    assert_eq!(account.balance, 100);
    assert!(engine.verify_ledger(&user).unwrap().is_valid);
}

#[test]
fn tampered_row_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(may(3)));
    let user = UserId::from("juniper");
    let engine = open(dir.path(), &clock);

    engine.award_points(&user, 10, PointSource::Vote, "vote").unwrap();
    engine.award_points(&user, 10, PointSource::Vote, "vote").unwrap();

    let row = dir.path().join("ledger").join("juniper").join("0000000001.json");
    let text = std::fs::read_to_string(&row).unwrap();
    std::fs::write(&row, text.replace("\"amount\": 10", "\"amount\": 1000")).unwrap();

    let report = engine.verify_ledger(&user).unwrap();
    assert!(!report.chain_valid);
    assert!(!report.is_valid);
    assert!(!report.errors.is_empty());
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"level_step": 50, "points": {"upvote_received": 4}}"#).unwrap();

    let config = EngineConfig::from_json_file(&path).unwrap();
    assert_eq!(config.level_step, 50);
    assert_eq!(config.points.upvote_received, 4);
    assert_eq!(config.points.best_answer, 25);

    let store = FileStore::new(dir.path().join("data")).unwrap();
    let engine = ReputationEngine::new(Arc::new(store), config).unwrap();
    let result = engine
        .award_points(&UserId::from("juniper"), 50, PointSource::Vote, "votes")
        .unwrap();
    assert_eq!(result.account.level, 2);
}
