//! Stress test: progressive chains over many passes.
//!
//! Validates chain monotonicity, the one-level-per-pass rule, and that
//! regressions in statistics never revoke an unlock.

use std::sync::Arc;

use packrank::achievement::{AchievementCategory, AchievementChain, Rarity};
use packrank::{
    AchievementCatalog, AchievementDefinition, ChainId, ReputationEngine, ReputationStore, UserId,
    UserStats,
};

fn chain_level(engine: &ReputationEngine, user: &UserId, chain: &str) -> u32 {
    engine
        .store()
        .chain_progress(user)
        .unwrap()
        .into_iter()
        .find(|c| c.chain_id == ChainId::new(chain))
        .map_or(0, |c| c.current_level)
}

#[test]
fn stress_every_chain_completes_one_level_at_a_time() {
    let engine = ReputationEngine::in_memory();
    let user = UserId::from("marathon-mutt");
    let stats = UserStats {
        answers_posted: 1_000,
        events_attended: 1_000,
        streak_days: 1_000,
        ..Default::default()
    };

    let mut previous = [0u32; 3];
    for pass in 1..=8u32 {
        engine.evaluate_activity(&user, &stats);
        let levels = [
            chain_level(&engine, &user, "helpful_paw"),
            chain_level(&engine, &user, "event_explorer"),
            chain_level(&engine, &user, "streak_keeper"),
        ];
        let totals = [5u32, 3, 4];
        for i in 0..3 {
            assert!(levels[i] >= previous[i], "chain {i} went backwards");
            assert!(levels[i] - previous[i] <= 1, "chain {i} skipped a level");
            assert_eq!(levels[i], pass.min(totals[i]));
        }
        previous = levels;
    }

    let completed: Vec<_> = engine
        .store()
        .chain_progress(&user)
        .unwrap()
        .into_iter()
        .filter(|c| c.completed_at.is_some())
        .collect();
    assert_eq!(completed.len(), 3);
}

#[test]
fn stress_regression_never_revokes() {
    let engine = ReputationEngine::in_memory();
    let user = UserId::from("fickle-fido");
    let high = UserStats {
        answers_posted: 30,
        ..Default::default()
    };
    engine.evaluate_activity(&user, &high);
    engine.evaluate_activity(&user, &high);
    assert_eq!(chain_level(&engine, &user, "helpful_paw"), 2);

    let low = UserStats::default();
    for _ in 0..10 {
        assert!(engine.evaluate_activity(&user, &low).newly_unlocked.is_empty());
    }
    assert_eq!(chain_level(&engine, &user, "helpful_paw"), 2);
    let unlocked = engine
        .list_achievements(&user, Default::default())
        .unwrap()
        .unlocked;
    assert_eq!(unlocked.len(), 3);
}

#[test]
fn stress_long_custom_chain() {
    let levels: Vec<AchievementDefinition> = (1..=50u32)
        .map(|level| {
            AchievementDefinition::chain_level(
                "marathon",
                level,
                &format!("marathon_{level}"),
                &format!("Marathon {level}"),
                "Walk more",
                AchievementCategory::Exploration,
                Rarity::Common,
                1,
            )
            .requires("walks_logged", level * 10)
        })
        .collect();
    let catalog = AchievementCatalog::builder()
        .chain(AchievementChain::new("marathon", "Marathon", levels))
        .build()
        .unwrap();
    let engine = ReputationEngine::in_memory().with_catalog(Arc::new(catalog));
    let user = UserId::from("walker");

    let mut stats = UserStats::default();
    stats
        .custom
        .insert("walks_logged".into(), packrank::achievement::StatValue::Number(500.0));

    for _ in 0..60 {
        engine.evaluate_activity(&user, &stats);
    }
    assert_eq!(chain_level(&engine, &user, "marathon"), 50);
    let account = engine.get_points_snapshot(&user).unwrap();
    assert_eq!(account.balance, 50);
    assert!(engine.verify_ledger(&user).unwrap().is_valid);
}
