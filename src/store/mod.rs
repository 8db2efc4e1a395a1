//! Storage port for principals, usage records, and billing events.
//!
//! ARCHITECTURE
//! ============
//! The entitlement core never touches process-local maps for billable state:
//! multiple server instances share one datastore. Services depend on the
//! [`EntitlementStore`] trait; production injects the Postgres adapter and
//! tests inject the in-memory one. Both adapters implement conditional
//! debit/reserve primitives so a read-then-write race can only lose cleanly.

pub mod memory;
pub mod pg;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::tiers::Plan;

pub use memory::MemoryStore;
pub use pg::PgStore;

// =============================================================================
// RECORDS
// =============================================================================

/// Read-side snapshot of a principal, consumed by the tier resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrincipalSnapshot {
    pub id: Uuid,
    pub plan: Plan,
    pub credits: i64,
    pub free_generations_used: i32,
    pub free_generations_limit: i32,
    pub is_admin: bool,
    pub banned: bool,
}

/// Kind of metered action tracked by the usage ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Generation,
}

impl ActionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generation => "generation",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-principal, per-action counter for the current calendar-month period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub principal_id: Uuid,
    pub action_kind: ActionKind,
    pub count: i64,
    pub period_start: OffsetDateTime,
    pub reset_at: OffsetDateTime,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("principal not found: {0}")]
    PrincipalNotFound(Uuid),
    #[error("corrupt plan value: {0}")]
    InvalidPlan(String),
}

// =============================================================================
// PORT
// =============================================================================

/// Storage operations the entitlement core requires.
///
/// Mutation contract: `debit_credits` and `reserve_free_generation` are
/// conditional single-step updates — under concurrent calls against the same
/// principal at most the available budget is consumed, and losers observe a
/// clean rejection rather than a corrupted balance.
#[async_trait::async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Load a principal snapshot, or `None` if the principal does not exist.
    async fn load_snapshot(&self, id: Uuid) -> Result<Option<PrincipalSnapshot>, StoreError>;

    /// Atomically debit `amount` credits. Returns the new balance, or `None`
    /// when the balance is insufficient (balance left unchanged) or the
    /// principal does not exist.
    async fn debit_credits(&self, id: Uuid, amount: i64) -> Result<Option<i64>, StoreError>;

    /// Atomically add `amount` credits, returning the new balance.
    async fn credit_credits(&self, id: Uuid, amount: i64) -> Result<i64, StoreError>;

    /// Overwrite the credit balance (webhook/admin use only).
    async fn set_credit_balance(&self, id: Uuid, balance: i64) -> Result<(), StoreError>;

    /// Overwrite the plan (webhook/admin use only).
    async fn set_plan(&self, id: Uuid, plan: Plan) -> Result<(), StoreError>;

    /// Atomically consume one free-trial generation. Returns `false` when the
    /// trial allotment is exhausted (counter left unchanged).
    async fn reserve_free_generation(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Load the usage record for `(id, kind)`, or `None` if never created.
    async fn load_usage(
        &self,
        id: Uuid,
        kind: ActionKind,
    ) -> Result<Option<UsageRecord>, StoreError>;

    /// Upsert a usage record.
    async fn save_usage(&self, record: &UsageRecord) -> Result<(), StoreError>;

    /// Record a billing event id. Returns `false` when the id was already
    /// recorded (replayed webhook delivery).
    async fn record_billing_event(&self, event_id: &str) -> Result<bool, StoreError>;
}
