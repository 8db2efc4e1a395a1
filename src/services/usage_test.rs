use super::*;
use time::macros::datetime;

use crate::store::MemoryStore;

// =============================================================================
// first_of_next_month
// =============================================================================

#[test]
fn mid_month_resets_at_next_first() {
    let now = datetime!(2025-01-15 10:30:00 UTC);
    assert_eq!(first_of_next_month(now), datetime!(2025-02-01 00:00:00 UTC));
}

#[test]
fn first_of_month_resets_at_next_first_not_same_day() {
    let now = datetime!(2025-03-01 00:00:00 UTC);
    assert_eq!(first_of_next_month(now), datetime!(2025-04-01 00:00:00 UTC));
}

#[test]
fn december_rolls_into_next_year() {
    let now = datetime!(2025-12-31 23:59:59 UTC);
    assert_eq!(first_of_next_month(now), datetime!(2026-01-01 00:00:00 UTC));
}

// =============================================================================
// get_usage — lazy reset
// =============================================================================

#[tokio::test]
async fn first_access_creates_zeroed_record() {
    let store = MemoryStore::new();
    let id = uuid::Uuid::new_v4();
    let now = datetime!(2025-01-15 12:00:00 UTC);

    let record = get_usage_at(&store, id, ActionKind::Generation, now).await.unwrap();
    assert_eq!(record.count, 0);
    assert_eq!(record.period_start, now);
    assert_eq!(record.reset_at, datetime!(2025-02-01 00:00:00 UTC));
}

#[tokio::test]
async fn repeated_access_within_period_is_stable() {
    let store = MemoryStore::new();
    let id = uuid::Uuid::new_v4();
    let now = datetime!(2025-01-15 12:00:00 UTC);

    increment_at(&store, id, ActionKind::Generation, 10, now).await.unwrap();
    increment_at(&store, id, ActionKind::Generation, 10, now).await.unwrap();

    let first = get_usage_at(&store, id, ActionKind::Generation, now).await.unwrap();
    let second = get_usage_at(&store, id, ActionKind::Generation, now + time::Duration::days(5))
        .await
        .unwrap();
    assert_eq!(first.count, 2);
    assert_eq!(second.count, 2);
    assert_eq!(first.reset_at, second.reset_at);
}

#[tokio::test]
async fn access_past_reset_zeroes_count_and_advances_boundary() {
    let store = MemoryStore::new();
    let id = uuid::Uuid::new_v4();
    let created = datetime!(2025-01-15 12:00:00 UTC);

    increment_at(&store, id, ActionKind::Generation, 10, created).await.unwrap();

    let after_reset = datetime!(2025-02-03 09:00:00 UTC);
    let record = get_usage_at(&store, id, ActionKind::Generation, after_reset).await.unwrap();
    assert_eq!(record.count, 0);
    assert_eq!(record.period_start, after_reset);
    assert_eq!(record.reset_at, datetime!(2025-03-01 00:00:00 UTC));
}

#[tokio::test]
async fn reset_happens_exactly_once() {
    let store = MemoryStore::new();
    let id = uuid::Uuid::new_v4();
    let created = datetime!(2025-01-15 12:00:00 UTC);
    increment_at(&store, id, ActionKind::Generation, 10, created).await.unwrap();

    let after_reset = datetime!(2025-02-03 09:00:00 UTC);
    get_usage_at(&store, id, ActionKind::Generation, after_reset).await.unwrap();
    increment_at(&store, id, ActionKind::Generation, 10, after_reset).await.unwrap();

    // A second read in the new period must not reset again.
    let record = get_usage_at(&store, id, ActionKind::Generation, after_reset).await.unwrap();
    assert_eq!(record.count, 1);
}

// =============================================================================
// increment — limit enforcement
// =============================================================================

#[tokio::test]
async fn increment_counts_every_call() {
    let store = MemoryStore::new();
    let id = uuid::Uuid::new_v4();
    let now = datetime!(2025-06-10 08:00:00 UTC);

    for expected in 1..=3 {
        let record = increment_at(&store, id, ActionKind::Generation, 10, now).await.unwrap();
        assert_eq!(record.count, expected);
    }
}

#[tokio::test]
async fn increment_rejects_at_limit() {
    let store = MemoryStore::new();
    let id = uuid::Uuid::new_v4();
    let now = datetime!(2025-06-10 08:00:00 UTC);

    increment_at(&store, id, ActionKind::Generation, 2, now).await.unwrap();
    increment_at(&store, id, ActionKind::Generation, 2, now).await.unwrap();
    assert!(matches!(
        increment_at(&store, id, ActionKind::Generation, 2, now).await,
        Err(UsageError::LimitReached { limit: 2 })
    ));

    // Rejected increment does not change the count.
    let record = get_usage_at(&store, id, ActionKind::Generation, now).await.unwrap();
    assert_eq!(record.count, 2);
}

#[tokio::test]
async fn limit_resets_with_the_period() {
    let store = MemoryStore::new();
    let id = uuid::Uuid::new_v4();
    let now = datetime!(2025-06-10 08:00:00 UTC);

    increment_at(&store, id, ActionKind::Generation, 1, now).await.unwrap();
    assert!(increment_at(&store, id, ActionKind::Generation, 1, now).await.is_err());

    let next_month = datetime!(2025-07-01 00:00:00 UTC);
    assert!(increment_at(&store, id, ActionKind::Generation, 1, next_month).await.is_ok());
}

// =============================================================================
// monthly limits / status view
// =============================================================================

#[test]
fn monthly_limits_scale_with_plan() {
    assert!(monthly_limit(Plan::Free) < monthly_limit(Plan::Basic));
    assert!(monthly_limit(Plan::Basic) < monthly_limit(Plan::Professional));
    assert!(monthly_limit(Plan::Professional) < monthly_limit(Plan::Enterprise));
}

#[test]
fn status_view_clamps_remaining() {
    let now = datetime!(2025-06-10 08:00:00 UTC);
    let record = UsageRecord {
        principal_id: uuid::Uuid::new_v4(),
        action_kind: ActionKind::Generation,
        count: 12,
        period_start: now,
        reset_at: first_of_next_month(now),
    };

    let status = UsageStatus::from_record(&record, 10);
    assert_eq!(status.used, 12);
    assert_eq!(status.remaining, 0);
    assert_eq!(status.reset_at, datetime!(2025-07-01 00:00:00 UTC).unix_timestamp());
}
