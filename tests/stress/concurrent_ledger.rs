//! Concurrency test: parallel awards, spends, and evaluations.
//!
//! Validates that per-user locking loses no update and that unrelated users
//! proceed independently.

use std::sync::{Arc, Mutex};
use std::thread;

use packrank::{
    FileStore, EngineConfig, PointSource, ReputationEngine, ReputationError, UserId, UserStats,
};

#[test]
fn stress_50_threads_award_one_user() {
    let engine = Arc::new(ReputationEngine::in_memory());
    let user = UserId::from("busy-beagle");

    let mut handles = Vec::new();
    for _ in 0..50 {
        let engine = Arc::clone(&engine);
        let user = user.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..40 {
                engine
                    .award_points(&user, 3, PointSource::Vote, "upvote")
                    .expect("award should succeed");
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let account = engine.get_points_snapshot(&user).unwrap();
    assert_eq!(account.transaction_count, 2_000);
    assert_eq!(account.balance, 6_000);
    assert_eq!(account.balance, account.earned_total - account.spent_total);

    let status = engine.get_tier_status(&user).unwrap();
    assert_eq!(status.state.tier_points, 6_000);

    let report = engine.verify_ledger(&user).unwrap();
    assert!(report.is_valid, "errors: {:?}", report.errors);
}

#[test]
fn stress_concurrent_spends_never_overdraw() {
    let engine = Arc::new(ReputationEngine::in_memory());
    let user = UserId::from("thrifty-terrier");
    engine.award_points(&user, 100, PointSource::Adjustment, "seed").unwrap();

    let rejected = Arc::new(Mutex::new(0u32));
    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = Arc::clone(&engine);
        let user = user.clone();
        let rejected = Arc::clone(&rejected);
        handles.push(thread::spawn(move || {
            let result = engine.spend_points(
                &user,
                10,
                PointSource::Redemption {
                    item: "treat".into(),
                },
                "treat",
            );
            match result {
                Ok(_) => {}
                Err(ReputationError::InsufficientBalance { .. }) => {
                    *rejected.lock().unwrap() += 1;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let account = engine.get_points_snapshot(&user).unwrap();
    assert_eq!(account.balance, 0);
    assert_eq!(account.spent_total, 100);
    assert_eq!(*rejected.lock().unwrap(), 10);
}

#[test]
fn stress_concurrent_evaluations_pay_once() {
    let engine = Arc::new(ReputationEngine::in_memory());
    let user = UserId::from("eager-eagle");
    let stats = UserStats {
        answers_posted: 1,
        questions_asked: 1,
        ..Default::default()
    };

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = Arc::clone(&engine);
        let user = user.clone();
        let stats = stats.clone();
        handles.push(thread::spawn(move || {
            engine.evaluate_activity(&user, &stats).newly_unlocked.len()
        }));
    }
    let unlocked: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(unlocked, 2, "first_answer and first_question unlock exactly once");

    let account = engine.get_points_snapshot(&user).unwrap();
    assert_eq!(account.balance, 15);
    assert_eq!(account.transaction_count, 2);
}

#[test]
fn stress_many_users_on_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    let engine = Arc::new(ReputationEngine::new(Arc::new(store), EngineConfig::default()).unwrap());

    let mut handles = Vec::new();
    for u in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            let user = UserId::new(format!("pup-{u:02}"));
            for _ in 0..25 {
                engine
                    .award_points(&user, 2, PointSource::Vote, "upvote")
                    .expect("award should succeed");
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let users = engine.users().unwrap();
    assert_eq!(users.len(), 16);
    for user in &users {
        let account = engine.get_points_snapshot(user).unwrap();
        assert_eq!(account.balance, 50);
        assert!(engine.verify_ledger(user).unwrap().is_valid);
    }
}
