//! Queue Ranking Journeys
//!
//! Builds review queues from stored items and checks presentation order,
//! filters and the effect of the randomness factor.

use chrono::Duration;
use lectern_core::{
    rank_queue, score_queue, ItemFilter, ItemKind, NoJitter, RankingParameters, RawSchedulingConfig,
    SeededRandom,
};
use lectern_e2e_tests::harness::TestDatabaseManager;
use lectern_e2e_tests::mocks::{BatchConfig, TestDataFactory};

// ============================================================================
// DETERMINISTIC ORDER
// ============================================================================

#[test]
fn test_overdue_high_priority_beats_new_low_priority() {
    let now = TestDataFactory::start_time();
    let overdue = TestDataFactory::scheduled_item(1, 90, -1, now);
    let fresh = TestDataFactory::new_item(2, 10, now);

    let order = rank_queue(&[fresh, overdue], 0.0, now, &mut NoJitter);
    assert_eq!(order, vec![1, 2]);
}

#[test]
fn test_stored_queue_order_without_randomness() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let scenario = TestDataFactory::create_queue_scenario(&*db.store, now);
    let engine = db.engine();

    let queue = engine
        .next_items(&ItemFilter::all().due_only(now), now, &mut NoJitter)
        .unwrap();
    let ids: Vec<i64> = queue.iter().map(|item| item.id).collect();

    // overdue_high: 90 + 30(1 - e^-2)  ~ 115.9
    // new:          max(10, 60)        = 60
    // due_today:    50 + 0             = 50
    // overdue_low:  20 + 30(1 - e^-3/7) ~ 30.5
    assert_eq!(
        ids,
        vec![
            scenario.id("overdue_high"),
            scenario.id("new"),
            scenario.id("due_today"),
            scenario.id("overdue_low"),
        ]
    );
    assert!(!ids.contains(&scenario.id("future")));
}

#[test]
fn test_equal_scores_fall_back_to_due_date_then_id() {
    let now = TestDataFactory::start_time();
    // Same priority, neither overdue by a whole day
    let later = TestDataFactory::scheduled_item(1, 40, 0, now);
    let mut earlier = TestDataFactory::scheduled_item(2, 40, 0, now);
    earlier.next_due_at = Some(now - Duration::hours(3));
    let twin = TestDataFactory::scheduled_item(3, 40, 0, now);

    let order = rank_queue(&[twin, later, earlier], 0.0, now, &mut NoJitter);
    assert_eq!(order, vec![2, 1, 3]);
}

#[test]
fn test_zero_randomness_never_consults_the_source() {
    struct Exploding;
    impl lectern_core::RandomSource for Exploding {
        fn next_uniform_signed(&mut self) -> f64 {
            panic!("random source used with zero randomness");
        }
    }

    let now = TestDataFactory::start_time();
    let items: Vec<_> = (1..=20)
        .map(|id| TestDataFactory::scheduled_item(id, (id * 5) as u8, -(id % 4), now))
        .collect();

    let ranked = score_queue(&items, 0.0, now, &RankingParameters::default(), &mut Exploding);
    assert_eq!(ranked.len(), 20);
    assert!(ranked.iter().all(|r| r.jitter == 0.0));
}

// ============================================================================
// RANDOMNESS
// ============================================================================

#[test]
fn test_same_seed_reproduces_queue() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    TestDataFactory::create_batch_with_config(
        &*db.store,
        BatchConfig {
            count: 40,
            spread_priority: true,
            ..Default::default()
        },
        now,
    );
    let engine = db.engine();
    let filter = ItemFilter::all();

    let first = engine
        .next_items_with(&filter, 0.8, now, &mut SeededRandom::new(7))
        .unwrap();
    let second = engine
        .next_items_with(&filter, 0.8, now, &mut SeededRandom::new(7))
        .unwrap();

    let ids = |items: &[lectern_core::Item]| items.iter().map(|i| i.id).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.len(), 40);
}

#[test]
fn test_randomness_is_bounded_by_jitter_scale() {
    let now = TestDataFactory::start_time();
    let items: Vec<_> = (1..=50)
        .map(|id| TestDataFactory::scheduled_item(id, 50, -(id % 10), now))
        .collect();
    let params = RankingParameters::default();

    let ranked = score_queue(&items, 1.0, now, &params, &mut SeededRandom::new(99));
    for entry in &ranked {
        assert!(entry.jitter.abs() <= params.jitter_scale);
        assert_eq!(entry.final_score, entry.base_score + entry.jitter);
    }
    assert!(ranked.windows(2).all(|w| w[0].final_score >= w[1].final_score));
}

#[test]
fn test_randomness_factor_is_clamped() {
    let now = TestDataFactory::start_time();
    let items: Vec<_> = (1..=10)
        .map(|id| TestDataFactory::scheduled_item(id, 50, -1, now))
        .collect();
    let params = RankingParameters::default();

    let clamped = score_queue(&items, 5.0, now, &params, &mut SeededRandom::new(3));
    let full = score_queue(&items, 1.0, now, &params, &mut SeededRandom::new(3));
    assert_eq!(clamped, full);

    let negative = rank_queue(&items, -2.0, now, &mut SeededRandom::new(3));
    let nan = rank_queue(&items, f64::NAN, now, &mut SeededRandom::new(3));
    let zero = rank_queue(&items, 0.0, now, &mut NoJitter);
    assert_eq!(negative, zero);
    assert_eq!(nan, zero);
}

#[test]
fn test_configured_randomness_is_the_default() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    db.seed_items(25);
    let config = RawSchedulingConfig {
        randomness_factor: 0.6,
        ..RawSchedulingConfig::default()
    }
    .validate()
    .unwrap();
    let engine = db.engine_with(config);
    let filter = ItemFilter::all();

    let implicit = engine.next_items(&filter, now, &mut SeededRandom::new(11)).unwrap();
    let explicit = engine
        .next_items_with(&filter, 0.6, now, &mut SeededRandom::new(11))
        .unwrap();
    assert_eq!(implicit, explicit);
}

// ============================================================================
// FILTERS
// ============================================================================

#[test]
fn test_filters_restrict_candidates() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    db.seed_diverse(4);
    let engine = db.engine();

    let extracts = engine
        .next_items(&ItemFilter::all().kind(ItemKind::Extract), now, &mut NoJitter)
        .unwrap();
    assert_eq!(extracts.len(), 4);
    assert!(extracts.iter().all(|item| item.kind == ItemKind::Extract));

    let favorites = engine
        .next_items(&ItemFilter::all().category(1).favorites(), now, &mut NoJitter)
        .unwrap();
    assert_eq!(favorites.len(), 2);
    assert!(favorites.iter().all(|item| item.favorite && item.category_id == Some(1)));
}

#[test]
fn test_future_items_leave_the_due_queue_after_review() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let ids = db.seed_items(3);
    let engine = db.engine();

    engine.review(ids[0], 3).unwrap();

    let due = engine
        .next_items(&ItemFilter::all().due_only(now), now, &mut NoJitter)
        .unwrap();
    assert_eq!(due.len(), 2);
    assert!(due.iter().all(|item| item.id != ids[0]));

    let later = now + Duration::days(3);
    let due_later = engine
        .next_items(&ItemFilter::all().due_only(later), later, &mut NoJitter)
        .unwrap();
    assert_eq!(due_later.len(), 3);
}

#[test]
fn test_empty_candidate_set() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let engine = db.engine();

    let queue = engine
        .next_items(&ItemFilter::all(), now, &mut SeededRandom::new(1))
        .unwrap();
    assert!(queue.is_empty());
}
