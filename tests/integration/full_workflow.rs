//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Record community activity (points by schedule, achievement pass)
//! 2. Spend points on a reward
//! 3. Climb the tier ladder
//! 4. Advance a progressive chain one level per pass
//! 5. Discover a hidden achievement
//! 6. Verify the ledger and query history

use std::sync::Arc;

use chrono::NaiveDate;

use packrank::time::date_to_micros;
use packrank::{
    AchievementId, ActivityEvent, AuthorCredibility, ChainId, Engagement, ListOptions,
    ManualClock, PointSource, QualityTier, ReputationEngine, ReputationStore, ScoreRequest, Tier,
    TransactionKind, TransactionQuery, UserId, UserStats,
};

fn engine_at(year: i32, month: u32, day: u32) -> (ReputationEngine, Arc<ManualClock>) {
    let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
    let clock = Arc::new(ManualClock::new(date_to_micros(date)));
    let engine = ReputationEngine::in_memory().with_clock(clock.clone());
    (engine, clock)
}

#[test]
fn full_workflow_activity_to_tiers() {
    let (engine, clock) = engine_at(2026, 5, 4);
    let user = UserId::from("ollie");

    // ── Step 1: Ask a question ──────────────────────────────────────────
    let mut stats = UserStats {
        questions_asked: 1,
        ..Default::default()
    };
    let outcome = engine
        .record_activity(&user, &ActivityEvent::QuestionAsked, &stats)
        .expect("question should record");
    assert_eq!(outcome.transaction.as_ref().unwrap().transaction.amount, 3);
    let ids: Vec<_> = outcome.evaluation.newly_unlocked.iter().map(|a| a.id.0.as_str()).collect();
    assert_eq!(ids, vec!["first_question"]);

    // ── Step 2: Post an excellent answer ────────────────────────────────
    clock.advance_days(1);
    stats.answers_posted = 1;
    let outcome = engine
        .record_activity(
            &user,
            &ActivityEvent::AnswerPosted {
                quality: QualityTier::Excellent,
            },
            &stats,
        )
        .expect("answer should record");
    assert_eq!(outcome.transaction.as_ref().unwrap().transaction.amount, 20);
    assert_eq!(outcome.evaluation.newly_unlocked[0].id, AchievementId::new("first_answer"));

    let account = engine.get_points_snapshot(&user).unwrap();
    assert_eq!(account.balance, 3 + 5 + 20 + 10);

    // ── Step 3: Spend on a reward ───────────────────────────────────────
    let spent = engine
        .spend_points(
            &user,
            30,
            PointSource::Redemption {
                item: "treat_voucher".into(),
            },
            "Treat voucher",
        )
        .expect("spend within balance");
    assert_eq!(spent.account.balance, 8);
    assert_eq!(spent.account.spent_total, 30);
    assert!(spent.tier_change.is_none());

    // ── Step 4: Reach gold ──────────────────────────────────────────────
    let big = engine
        .award_points(&user, 5_000, PointSource::Adjustment, "Community import")
        .unwrap();
    let change = big.tier_change.expect("should change tier");
    assert_eq!(change.from, Tier::Bronze);
    assert_eq!(change.to, Tier::Gold);

    let status = engine.get_tier_status(&user).unwrap();
    assert_eq!(status.state.current_tier, Tier::Gold);
    assert_eq!(status.state.tier_points, 5_038, "spends never reduce tier points");
    assert_eq!(status.next_tier, Some(Tier::Platinum));
    assert!(status.benefits.contains(&"priority_partner_booking".to_string()));

    // ── Step 5: Verify and query ────────────────────────────────────────
    let report = engine.verify_ledger(&user).unwrap();
    assert!(report.is_valid, "errors: {:?}", report.errors);
    assert_eq!(report.transaction_count, 6);

    let spends = engine
        .transaction_history(&user, &TransactionQuery::new().kind(TransactionKind::Spend))
        .unwrap();
    assert_eq!(spends.len(), 1);
    let rewards = engine
        .transaction_history(&user, &TransactionQuery::new().source("achievement"))
        .unwrap();
    assert_eq!(rewards.len(), 2);
}

#[test]
fn chain_advances_one_level_per_pass() {
    let (engine, clock) = engine_at(2026, 5, 4);
    let user = UserId::from("pepper");
    let chain = ChainId::new("helpful_paw");

    let stats = UserStats {
        answers_posted: 30,
        ..Default::default()
    };
    engine.evaluate_activity(&user, &stats);
    clock.advance(1);
    engine.evaluate_activity(&user, &stats);

    let level = |engine: &ReputationEngine| {
        engine
            .store()
            .chain_progress(&user)
            .unwrap()
            .into_iter()
            .find(|c| c.chain_id == chain)
            .map(|c| c.current_level)
    };
    assert_eq!(level(&engine), Some(2));

    // Enough answers for level 4, but only level 3 unlocks this pass.
    let stats = UserStats {
        answers_posted: 160,
        ..Default::default()
    };
    clock.advance(1);
    let outcome = engine.evaluate_activity(&user, &stats);
    let ids: Vec<_> = outcome.newly_unlocked.iter().map(|a| a.id.0.clone()).collect();
    assert_eq!(ids, vec!["helpful_paw_3".to_string()]);
    assert_eq!(outcome.newly_unlocked[0].chain, Some((chain.clone(), 3)));
    assert_eq!(level(&engine), Some(3));

    clock.advance(1);
    let outcome = engine.evaluate_activity(&user, &stats);
    assert_eq!(outcome.newly_unlocked[0].id, AchievementId::new("helpful_paw_4"));
    assert_eq!(level(&engine), Some(4));
}

#[test]
fn hidden_achievement_discovery() {
    let (engine, _) = engine_at(2026, 5, 4);
    let user = UserId::from("nova");

    let stats = UserStats {
        consecutive_night_activity_days: 4,
        ..Default::default()
    };
    assert!(engine.evaluate_activity(&user, &stats).discovered_hidden.is_empty());

    let listing = engine
        .list_achievements(
            &user,
            ListOptions {
                include_locked: true,
                include_hidden: false,
            },
        )
        .unwrap();
    assert!(listing.locked_visible.iter().all(|a| !a.is_hidden));
    assert!(listing.unlocked.is_empty());
    assert_eq!(listing.hints.len(), 1);

    let stats = UserStats {
        consecutive_night_activity_days: 7,
        ..Default::default()
    };
    let outcome = engine.evaluate_activity(&user, &stats);
    assert_eq!(outcome.discovered_hidden.len(), 1);
    assert_eq!(outcome.discovered_hidden[0].id, AchievementId::new("night_howler"));
    assert!(outcome.newly_unlocked.is_empty());

    let listing = engine.list_achievements(&user, ListOptions::default()).unwrap();
    assert_eq!(listing.unlocked.len(), 1);
    assert!(listing.unlocked[0].is_hidden);
    assert!(listing.hints.is_empty());
    assert_eq!(engine.get_points_snapshot(&user).unwrap().balance, 50);
}

#[test]
fn answer_scores_through_engine() {
    let engine = ReputationEngine::in_memory();

    let short = engine.score_answer(&ScoreRequest {
        answer_text: "Dogs like walks a lot so maybe just go outside more often.".into(),
        question_title: "Why does my puppy cry in the crate at night?".into(),
        question_content: "Our new puppy whines in the crate every night.".into(),
        category: "training".into(),
        ..Default::default()
    });
    assert!(short.overall_score < 0.5);
    assert!(matches!(short.tier, QualityTier::Poor | QualityTier::Fair));

    let expert = engine.score_answer(&ScoreRequest {
        answer_text: "\
In my experience crate training a rescue puppy takes patience, and my vet agreed with this plan.
According to published guidelines from veterinary behaviorists, short positive sessions work best.
1. Start by feeding meals near the open crate so the puppy links it with food.
2. Close the door for a few seconds, then minutes, rewarding calm behavior with treats.
3. Avoid using the crate as punishment and make sure water is available.
- Keep a worn shirt inside so the crate smells like you.
- Exercise the puppy before longer crate periods at night.
You should see steady progress within two weeks; if crying at night persists, talk with your vet."
            .into(),
        question_title: "How do I crate train a rescue puppy?".into(),
        question_content: "Our rescue puppy cries in the crate at night. What training steps work?"
            .into(),
        engagement: Engagement {
            upvotes: 15,
            downvotes: 1,
            is_best_answer: true,
            response_time_hours: Some(0.75),
            answer_position: Some(1),
        },
        author: AuthorCredibility {
            is_verified_expert: true,
            specializations: vec!["Training".into(), "Behavior".into()],
            rating_average: Some(4.8),
            years_experience: Some(8.0),
        },
        category: "training".into(),
    });
    assert!(expert.overall_score >= 0.85, "score {}", expert.overall_score);
    assert!(matches!(expert.tier, QualityTier::Excellent | QualityTier::Outstanding));

    let broken = engine.score_answer(&ScoreRequest::default());
    assert!(broken.is_fallback);
}
