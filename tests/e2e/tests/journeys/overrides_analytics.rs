//! Overrides and Analytics Journeys
//!
//! Manual priority and due-date changes, queue statistics, the due
//! forecast, leech detection and JSON configuration.

use chrono::Duration;
use lectern_core::{
    DifficultyTrend, EngineError, ItemFilter, ItemStore, NewItem, NoJitter, RawSchedulingConfig,
    SchedulingConfig,
};
use lectern_e2e_tests::harness::TestDatabaseManager;
use lectern_e2e_tests::mocks::TestDataFactory;

// ============================================================================
// PRIORITY OVERRIDES
// ============================================================================

#[test]
fn test_priority_override_bounds() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let engine = db.engine();
    let item = engine.add_item(NewItem::new("prioritized")).unwrap();

    assert_eq!(engine.set_priority(item.id, 0).unwrap().priority, 0);
    assert_eq!(engine.set_priority(item.id, 100).unwrap().priority, 100);

    for bad in [-1, 101, 1_000] {
        let err = engine.set_priority(item.id, bad).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPriority(p) if p == bad));
        assert!(err.is_validation());
    }
    let stored = db.store.load_item(item.id).unwrap().unwrap();
    assert_eq!(stored.priority, 100);
}

#[test]
fn test_priority_override_reorders_queue() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let scenario = TestDataFactory::create_queue_scenario(&*db.store, now);
    let engine = db.engine();

    engine.set_priority(scenario.id("overdue_high"), 0).unwrap();

    let queue = engine
        .next_items(&ItemFilter::all().due_only(now), now, &mut NoJitter)
        .unwrap();
    let ids: Vec<i64> = queue.iter().map(|item| item.id).collect();
    // The overdue bonus alone (~25.9) no longer beats the others
    assert_eq!(
        ids,
        vec![
            scenario.id("new"),
            scenario.id("due_today"),
            scenario.id("overdue_low"),
            scenario.id("overdue_high"),
        ]
    );
}

#[test]
fn test_priority_override_keeps_memory_state() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let engine = db.engine();
    let item = engine.add_item(NewItem::new("reviewed")).unwrap();
    let outcome = engine.review(item.id, 3).unwrap();

    let updated = engine.set_priority(item.id, 5).unwrap();
    assert_eq!(updated.stability, Some(outcome.stability));
    assert_eq!(updated.next_due_at, Some(outcome.next_due_at));
    assert_eq!(updated.review_count, 1);
}

// ============================================================================
// DUE-DATE OVERRIDES
// ============================================================================

#[test]
fn test_reschedule_moves_due_date_without_touching_memory() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let engine = db.engine();
    let item = engine.add_item(NewItem::new("postponed")).unwrap();
    let outcome = engine.review(item.id, 3).unwrap();

    let target = now + Duration::days(30);
    let moved = engine.reschedule(item.id, target).unwrap();
    assert_eq!(moved.next_due_at, Some(target));
    assert_eq!(moved.stability, Some(outcome.stability));
    assert_eq!(moved.difficulty, Some(outcome.difficulty));
    assert_eq!(moved.review_count, 1);
    assert_eq!(engine.rating_history(item.id).unwrap().len(), 1);
}

#[test]
fn test_reschedule_before_last_review_is_rejected() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let engine = db.engine();
    let item = engine.add_item(NewItem::new("anchored")).unwrap();
    let outcome = engine.review(item.id, 3).unwrap();

    let err = engine.reschedule(item.id, now - Duration::days(1)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidDueDate { item_id, .. } if item_id == item.id));
    assert!(err.is_validation());

    let stored = db.store.load_item(item.id).unwrap().unwrap();
    assert_eq!(stored.next_due_at, Some(outcome.next_due_at));

    // Exactly at the last review is allowed
    assert!(engine.reschedule(item.id, now).is_ok());
}

#[test]
fn test_rescheduled_new_item_is_rated_as_first_review() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let engine = db.engine();
    let item = engine.add_item(NewItem::new("deferred")).unwrap();

    let later = now + Duration::days(4);
    engine.reschedule(item.id, later).unwrap();
    db.clock.set(later);

    let outcome = engine.review(item.id, 3).unwrap();
    assert_eq!(outcome.interval_days, 3);
    assert_eq!(outcome.event.elapsed_days, 0.0);
}

#[test]
fn test_unknown_item_overrides() {
    let db = TestDatabaseManager::new_temp(TestDataFactory::start_time());
    let engine = db.engine();

    assert!(matches!(engine.set_priority(77, 10), Err(EngineError::ItemNotFound(77))));
    assert!(matches!(
        engine.reschedule(77, TestDataFactory::start_time()),
        Err(EngineError::ItemNotFound(77))
    ));
}

// ============================================================================
// STATISTICS AND FORECAST
// ============================================================================

#[test]
fn test_queue_stats_over_scenario() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    TestDataFactory::create_queue_scenario(&*db.store, now);
    let engine = db.engine();

    let stats = engine.queue_stats(now).unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.new_items, 1);
    assert_eq!(stats.due_now, 3);
    assert_eq!(stats.overdue, 2);
    // overdue_high, overdue_low, due_today and future (5 days)
    assert_eq!(stats.due_this_week, 4);
    assert!((stats.average_priority - 50.0).abs() < 1e-9);
}

#[test]
fn test_forecast_groups_by_day() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let scenario = TestDataFactory::create_queue_scenario(&*db.store, now);
    let engine = db.engine();

    let forecast = engine.due_forecast(now, 7).unwrap();
    assert_eq!(forecast.days.len(), 7);
    assert_eq!(forecast.days[0].date, now.date_naive());
    assert_eq!(forecast.days[0].item_ids, vec![scenario.id("due_today")]);
    assert_eq!(forecast.days[5].item_ids, vec![scenario.id("future")]);
    assert_eq!(
        forecast.overdue,
        vec![scenario.id("overdue_high"), scenario.id("overdue_low")]
    );
    assert_eq!(forecast.new, vec![scenario.id("new")]);
    assert_eq!(forecast.scheduled_count(), 2);

    // A short horizon leaves the future item out
    let short = engine.due_forecast(now, 3).unwrap();
    assert_eq!(short.scheduled_count(), 1);
}

#[test]
fn test_forecast_follows_reviews() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let ids = db.seed_items(4);
    let engine = db.engine();

    for id in &ids {
        engine.review(*id, 3).unwrap();
    }

    let forecast = engine.due_forecast(now, 5).unwrap();
    assert!(forecast.new.is_empty());
    assert_eq!(forecast.days[3].item_ids.len(), 4);
    // Highest priority first
    assert_eq!(forecast.days[3].item_ids[0], ids[3]);
}

// ============================================================================
// LEECHES
// ============================================================================

#[test]
fn test_repeated_lapses_flag_a_leech() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);
    let engine = db.engine();

    let stubborn = engine.add_item(NewItem::new("stubborn")).unwrap();
    let easy = engine.add_item(NewItem::new("easy")).unwrap();

    let mut at = now;
    for _ in 0..4 {
        at = engine.process_rating(stubborn.id, 1, at).unwrap().next_due_at;
    }
    engine.process_rating(easy.id, 1, now).unwrap();

    assert_eq!(engine.leeches(4).unwrap(), vec![stubborn.id]);
    assert_eq!(engine.leeches(1).unwrap(), vec![stubborn.id, easy.id]);
    assert!(engine.leeches(5).unwrap().is_empty());
    // Zero behaves like one
    assert_eq!(engine.leeches(0).unwrap(), engine.leeches(1).unwrap());
}

// ============================================================================
// ITEM METRICS
// ============================================================================

#[test]
fn test_item_metrics_follow_the_rating_log() {
    let now = TestDataFactory::start_time();
    let mut db = TestDatabaseManager::new_temp(now);
    let engine = db.engine();

    let item = engine.add_item(NewItem::new("Ethics, part 3")).unwrap();
    let fresh = engine.item_metrics(item.id).unwrap();
    assert_eq!(fresh.total_reviews, 0);
    assert_eq!(fresh.trend, DifficultyTrend::New);

    // rated on each due date: GOOD, EASY, raw 4, then a lapse
    let mut at = now;
    for raw in [3, 5, 4, 1] {
        at = engine.process_rating(item.id, raw, at).unwrap().next_due_at;
    }
    let history = engine.rating_history(item.id).unwrap();
    let span = (history[3].timestamp - history[0].timestamp).num_seconds() as f64 / 86_400.0;

    drop(engine);
    db.reopen();
    let metrics = db.engine().item_metrics(item.id).unwrap();
    assert_eq!(metrics.total_reviews, 4);
    assert!((metrics.success_rate - 0.75).abs() < 1e-12);
    assert!((metrics.retention_rate - 2.0 / 3.0).abs() < 1e-12);
    assert!((metrics.average_gap_days - span / 3.0).abs() < 1e-9);
    assert_eq!(metrics.recent_failures, 1);
    assert_eq!(metrics.trend, DifficultyTrend::Mixed);

    assert!(matches!(
        db.engine().item_metrics(item.id + 100),
        Err(EngineError::ItemNotFound(_))
    ));
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_config_from_json_drives_engine() {
    let now = TestDataFactory::start_time();
    let db = TestDatabaseManager::new_temp(now);

    let config = RawSchedulingConfig::from_json(
        r#"{ "minIntervalDays": 2, "maxIntervalDays": 30, "intervalModifier": 1.0 }"#,
    )
    .unwrap()
    .validate()
    .unwrap();
    let engine = db.engine_with(config);

    let item = engine.add_item(NewItem::new("configured")).unwrap();
    // AGAIN would be 1 day without the raised minimum
    assert_eq!(engine.review(item.id, 1).unwrap().interval_days, 2);
}

#[test]
fn test_config_rejections_are_collected() {
    let err = RawSchedulingConfig::from_json(
        r#"{ "minIntervalDays": 0, "targetRetention": 1.5, "randomnessFactor": 2 }"#,
    )
    .unwrap()
    .validate()
    .unwrap_err();
    assert_eq!(err.violations.len(), 3);

    let unknown = RawSchedulingConfig::from_json(r#"{ "retention": 0.9 }"#);
    assert!(unknown.is_err());
}

#[test]
fn test_config_round_trips_through_raw_form() {
    let config = SchedulingConfig::default();
    let json = serde_json::to_string(&config.to_raw()).unwrap();
    let parsed = RawSchedulingConfig::from_json(&json).unwrap().validate().unwrap();
    assert_eq!(parsed, config);
}
