//! Edge case tests: boundaries, malformed input, and calendar rollovers.

use std::sync::Arc;

use chrono::NaiveDate;

use packrank::achievement::{AchievementCategory, Rarity};
use packrank::time::date_to_micros;
use packrank::{
    AchievementCatalog, AchievementDefinition, EngineConfig, ListOptions, ManualClock, PointSource,
    ReputationEngine, ReputationError, Tier, TierEta, UserId, UserStats,
};

fn engine_on(date: NaiveDate) -> (ReputationEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(date_to_micros(date)));
    (ReputationEngine::in_memory().with_clock(clock.clone()), clock)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn zero_amounts_are_rejected() {
    let (engine, _) = engine_on(day(2026, 1, 10));
    let user = UserId::from("zero");
    let err = engine.award_points(&user, 0, PointSource::Vote, "nothing").unwrap_err();
    assert!(matches!(err, ReputationError::InvalidAmount(0)));
    let err = engine
        .spend_points(&user, 0, PointSource::Redemption { item: "x".into() }, "nothing")
        .unwrap_err();
    assert!(matches!(err, ReputationError::InvalidAmount(0)));
    assert_eq!(engine.get_points_snapshot(&user).unwrap().transaction_count, 0);
}

#[test]
fn spend_exact_balance_then_one_more() {
    let (engine, _) = engine_on(day(2026, 1, 10));
    let user = UserId::from("exact");
    engine.award_points(&user, 25, PointSource::BestAnswer, "best").unwrap();
    let redemption = || PointSource::Redemption {
        item: "leash".into(),
    };
    let ok = engine.spend_points(&user, 25, redemption(), "leash").unwrap();
    assert_eq!(ok.account.balance, 0);
    assert_eq!(ok.account.lifetime_total, 25);

    let err = engine.spend_points(&user, 1, redemption(), "leash").unwrap_err();
    match err {
        ReputationError::InsufficientBalance {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, 1);
            assert_eq!(available, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn year_end_rollover_resets_monthly_points() {
    let (engine, clock) = engine_on(day(2026, 12, 31));
    let user = UserId::from("newyear");
    engine.award_points(&user, 1_500, PointSource::Adjustment, "december").unwrap();
    assert_eq!(engine.get_tier_status(&user).unwrap().state.current_tier, Tier::Silver);

    clock.set(date_to_micros(day(2027, 1, 1)));
    let status = engine.get_tier_status(&user).unwrap();
    assert_eq!(status.state.month, "2027-01");
    assert_eq!(status.state.monthly_tier_points, 0);
    assert_eq!(status.state.current_tier, Tier::Bronze);

    let result = engine
        .award_points(&user, 50, PointSource::Adjustment, "january")
        .unwrap();
    assert_eq!(result.tier_change.unwrap().to, Tier::Silver);
}

#[test]
fn eta_unknown_after_quiet_month() {
    let (engine, clock) = engine_on(day(2026, 3, 1));
    let user = UserId::from("quiet");
    engine.award_points(&user, 100, PointSource::Vote, "votes").unwrap();
    clock.advance_days(45);
    let status = engine.get_tier_status(&user).unwrap();
    assert_eq!(status.eta, TierEta::Unknown);
    assert_eq!(status.average_daily_points, 0.0);
}

#[test]
fn malformed_requirement_never_unlocks() {
    let def = AchievementDefinition::standard(
        "confused",
        "Confused",
        "Flag threshold on a counter",
        AchievementCategory::Community,
        Rarity::Common,
        5,
    )
    .requires("answers_posted", true);
    let unknown_key = AchievementDefinition::standard(
        "mystery",
        "Mystery",
        "Unknown statistic",
        AchievementCategory::Community,
        Rarity::Common,
        5,
    )
    .requires("tail_wags", 3u32);
    let catalog = AchievementCatalog::builder()
        .achievement(def)
        .achievement(unknown_key)
        .build()
        .unwrap();

    let engine = ReputationEngine::in_memory().with_catalog(Arc::new(catalog));
    let user = UserId::from("edge");
    let stats = UserStats {
        answers_posted: 100,
        ..Default::default()
    };
    let outcome = engine.evaluate_activity(&user, &stats);
    assert!(outcome.newly_unlocked.is_empty());
    assert_eq!(engine.get_points_snapshot(&user).unwrap().balance, 0);
}

#[test]
fn unknown_dependency_keeps_achievement_locked() {
    let def = AchievementDefinition::standard(
        "orphan",
        "Orphan",
        "Depends on nothing that exists",
        AchievementCategory::Community,
        Rarity::Common,
        5,
    )
    .requires("answers_posted", 1u32)
    .depends_on("does_not_exist");
    let catalog = AchievementCatalog::builder().achievement(def).build().unwrap();
    let engine = ReputationEngine::in_memory().with_catalog(Arc::new(catalog));
    let user = UserId::from("edge");
    let stats = UserStats {
        answers_posted: 5,
        ..Default::default()
    };
    for _ in 0..3 {
        assert!(engine.evaluate_activity(&user, &stats).is_empty());
    }
    let listing = engine
        .list_achievements(
            &user,
            ListOptions {
                include_locked: true,
                include_hidden: false,
            },
        )
        .unwrap();
    assert_eq!(listing.locked_visible.len(), 1);
    assert_eq!(listing.locked_visible[0].progress_percentage, 100.0);
}

#[test]
fn invalid_config_is_refused() {
    let config = EngineConfig {
        level_step: 0,
        ..EngineConfig::default()
    };
    let err = ReputationEngine::new(Arc::new(packrank::MemoryStore::new()), config).err();
    assert!(matches!(err, Some(ReputationError::InvalidConfig(_))));
}

#[test]
fn streak_days_from_ledger_feed_chains() {
    let (engine, clock) = engine_on(day(2026, 6, 1));
    let user = UserId::from("streaky");
    for d in 1..=3u32 {
        engine
            .award_points(
                &user,
                5,
                PointSource::StreakDay {
                    day: day(2026, 6, d),
                },
                "streak",
            )
            .unwrap();
        clock.advance_days(1);
    }
    assert_eq!(engine.get_points_snapshot(&user).unwrap().streak_count, 3);

    let outcome = engine.evaluate_activity(&user, &UserStats::default());
    let ids: Vec<_> = outcome.newly_unlocked.iter().map(|a| a.id.0.as_str()).collect();
    assert_eq!(ids, vec!["streak_keeper_1"]);
}
