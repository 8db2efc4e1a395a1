//! Postgres adapter for the storage port.
//!
//! DESIGN
//! ======
//! Credit debits and free-trial reservations are single conditional `UPDATE`
//! statements with a `WHERE` guard and `RETURNING` clause, so the check and
//! the mutation are one atomic step at the row level. A `CHECK (credits >= 0)`
//! constraint backs the application guard.

use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{ActionKind, EntitlementStore, PrincipalSnapshot, StoreError, UsageRecord};
use crate::tiers::Plan;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn snapshot_from_row(row: &sqlx::postgres::PgRow) -> Result<PrincipalSnapshot, StoreError> {
    let plan_raw: String = row.get("plan");
    let plan: Plan = plan_raw
        .parse()
        .map_err(|_| StoreError::InvalidPlan(plan_raw))?;
    Ok(PrincipalSnapshot {
        id: row.get("id"),
        plan,
        credits: row.get("credits"),
        free_generations_used: row.get("free_generations_used"),
        free_generations_limit: row.get("free_generations_limit"),
        is_admin: row.get("is_admin"),
        banned: row.get("banned"),
    })
}

#[async_trait::async_trait]
impl EntitlementStore for PgStore {
    async fn load_snapshot(&self, id: Uuid) -> Result<Option<PrincipalSnapshot>, StoreError> {
        let row = sqlx::query(
            r"SELECT id, plan, credits, free_generations_used, free_generations_limit,
                     is_admin, banned
              FROM principals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(snapshot_from_row).transpose()
    }

    async fn debit_credits(&self, id: Uuid, amount: i64) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query(
            r"UPDATE principals
              SET credits = credits - $2, updated_at = now()
              WHERE id = $1 AND credits >= $2
              RETURNING credits",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("credits")))
    }

    async fn credit_credits(&self, id: Uuid, amount: i64) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r"UPDATE principals
              SET credits = credits + $2, updated_at = now()
              WHERE id = $1
              RETURNING credits",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.get("credits"))
            .ok_or(StoreError::PrincipalNotFound(id))
    }

    async fn set_credit_balance(&self, id: Uuid, balance: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE principals SET credits = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(balance)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PrincipalNotFound(id));
        }
        Ok(())
    }

    async fn set_plan(&self, id: Uuid, plan: Plan) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE principals SET plan = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(plan.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PrincipalNotFound(id));
        }
        Ok(())
    }

    async fn reserve_free_generation(&self, id: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r"UPDATE principals
              SET free_generations_used = free_generations_used + 1, updated_at = now()
              WHERE id = $1 AND free_generations_used < free_generations_limit
              RETURNING free_generations_used",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn load_usage(
        &self,
        id: Uuid,
        kind: ActionKind,
    ) -> Result<Option<UsageRecord>, StoreError> {
        let row = sqlx::query(
            r"SELECT count, period_start, reset_at
              FROM usage_records
              WHERE principal_id = $1 AND action_kind = $2",
        )
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UsageRecord {
            principal_id: id,
            action_kind: kind,
            count: r.get("count"),
            period_start: r.get::<OffsetDateTime, _>("period_start"),
            reset_at: r.get::<OffsetDateTime, _>("reset_at"),
        }))
    }

    async fn save_usage(&self, record: &UsageRecord) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO usage_records (principal_id, action_kind, count, period_start, reset_at)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (principal_id, action_kind) DO UPDATE
              SET count = EXCLUDED.count,
                  period_start = EXCLUDED.period_start,
                  reset_at = EXCLUDED.reset_at",
        )
        .bind(record.principal_id)
        .bind(record.action_kind.as_str())
        .bind(record.count)
        .bind(record.period_start)
        .bind(record.reset_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_billing_event(&self, event_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO billing_events (event_id) VALUES ($1) ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
