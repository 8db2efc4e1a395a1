//! Usage ledger — per-principal monthly counters with lazy resets.
//!
//! DESIGN
//! ======
//! The period boundary is the first instant of the NEXT CALENDAR MONTH from
//! the record's creation or last reset, not a rolling 30-day window: a record
//! created Jan 15 resets at Feb 1. Resets happen lazily on access; no
//! background sweeper. Counts beyond the limit check are advisory (dashboard
//! data), so concurrent increments tolerate eventual consistency — the hard
//! budget lives in the credit account, not here.
//!
//! `increment` is deliberately not idempotent: two calls count as two
//! actions. Callers invoke it at most once per successful generation.

use std::sync::OnceLock;

use time::{Date, Month, OffsetDateTime, Time};
use uuid::Uuid;

use crate::store::{ActionKind, EntitlementStore, StoreError, UsageRecord};
use crate::tiers::Plan;

const DEFAULT_FREE_MONTHLY_LIMIT: i64 = 10;
const DEFAULT_BASIC_MONTHLY_LIMIT: i64 = 50;
const DEFAULT_PROFESSIONAL_MONTHLY_LIMIT: i64 = 200;
const DEFAULT_ENTERPRISE_MONTHLY_LIMIT: i64 = 1000;

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Plan-derived monthly generation ceiling for the ledger.
#[must_use]
pub fn monthly_limit(plan: Plan) -> i64 {
    static LIMITS: OnceLock<[i64; 4]> = OnceLock::new();
    let limits = LIMITS.get_or_init(|| {
        [
            env_parse("MONTHLY_LIMIT_FREE", DEFAULT_FREE_MONTHLY_LIMIT),
            env_parse("MONTHLY_LIMIT_BASIC", DEFAULT_BASIC_MONTHLY_LIMIT),
            env_parse("MONTHLY_LIMIT_PROFESSIONAL", DEFAULT_PROFESSIONAL_MONTHLY_LIMIT),
            env_parse("MONTHLY_LIMIT_ENTERPRISE", DEFAULT_ENTERPRISE_MONTHLY_LIMIT),
        ]
    });
    match plan {
        Plan::Free => limits[0],
        Plan::Basic => limits[1],
        Plan::Professional => limits[2],
        Plan::Enterprise => limits[3],
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("monthly limit reached ({limit} actions this period)")]
    LimitReached { limit: i64 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

// =============================================================================
// PERIOD MATH
// =============================================================================

/// First instant (UTC midnight) of the calendar month after `now`.
#[must_use]
pub fn first_of_next_month(now: OffsetDateTime) -> OffsetDateTime {
    let date = now.date();
    let year = if date.month() == Month::December { date.year() + 1 } else { date.year() };
    // Day 1 of a valid month cannot fail to construct.
    Date::from_calendar_date(year, date.month().next(), 1)
        .map_or(now, |d| d.with_time(Time::MIDNIGHT).assume_utc())
}

fn fresh_record(principal_id: Uuid, kind: ActionKind, now: OffsetDateTime) -> UsageRecord {
    UsageRecord {
        principal_id,
        action_kind: kind,
        count: 0,
        period_start: now,
        reset_at: first_of_next_month(now),
    }
}

// =============================================================================
// LEDGER OPERATIONS
// =============================================================================

/// Read the usage record for `(principal, kind)`, applying the lazy reset.
///
/// Creates a zeroed record on first access. When `now >= reset_at`, the count
/// is reset to zero exactly once and a new period starting at `now` is
/// persisted.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn get_usage(
    store: &dyn EntitlementStore,
    principal_id: Uuid,
    kind: ActionKind,
) -> Result<UsageRecord, StoreError> {
    get_usage_at(store, principal_id, kind, OffsetDateTime::now_utc()).await
}

async fn get_usage_at(
    store: &dyn EntitlementStore,
    principal_id: Uuid,
    kind: ActionKind,
    now: OffsetDateTime,
) -> Result<UsageRecord, StoreError> {
    match store.load_usage(principal_id, kind).await? {
        Some(record) if now < record.reset_at => Ok(record),
        Some(stale) => {
            let record = fresh_record(principal_id, kind, now);
            store.save_usage(&record).await?;
            tracing::debug!(
                %principal_id,
                kind = %kind,
                expired_count = stale.count,
                "usage: period reset"
            );
            Ok(record)
        }
        None => {
            let record = fresh_record(principal_id, kind, now);
            store.save_usage(&record).await?;
            Ok(record)
        }
    }
}

/// Count one metered action against the current period.
///
/// # Errors
///
/// Returns [`UsageError::LimitReached`] when the post-reset count has hit
/// `limit`; propagates storage failures.
pub async fn increment(
    store: &dyn EntitlementStore,
    principal_id: Uuid,
    kind: ActionKind,
    limit: i64,
) -> Result<UsageRecord, UsageError> {
    increment_at(store, principal_id, kind, limit, OffsetDateTime::now_utc()).await
}

async fn increment_at(
    store: &dyn EntitlementStore,
    principal_id: Uuid,
    kind: ActionKind,
    limit: i64,
    now: OffsetDateTime,
) -> Result<UsageRecord, UsageError> {
    let mut record = get_usage_at(store, principal_id, kind, now).await?;
    if record.count >= limit {
        return Err(UsageError::LimitReached { limit });
    }
    record.count += 1;
    store.save_usage(&record).await?;
    Ok(record)
}

// =============================================================================
// STATUS VIEW
// =============================================================================

/// Usage summary exposed by `GET /api/usage`.
#[derive(Debug, serde::Serialize)]
pub struct UsageStatus {
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
    /// Unix seconds of the next period boundary.
    pub reset_at: i64,
}

impl UsageStatus {
    #[must_use]
    pub fn from_record(record: &UsageRecord, limit: i64) -> Self {
        Self {
            used: record.count,
            limit,
            remaining: (limit - record.count).max(0),
            reset_at: record.reset_at.unix_timestamp(),
        }
    }
}

#[cfg(test)]
#[path = "usage_test.rs"]
mod tests;
