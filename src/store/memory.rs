//! In-memory adapter for the storage port.
//!
//! Used by tests and local development without a database. A single mutex
//! guards all state, so the conditional debit/reserve operations are atomic
//! the same way the Postgres conditional updates are.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use uuid::Uuid;

use super::{ActionKind, EntitlementStore, PrincipalSnapshot, StoreError, UsageRecord};
use crate::tiers::Plan;

#[derive(Default)]
struct Inner {
    principals: HashMap<Uuid, PrincipalSnapshot>,
    usage: HashMap<(Uuid, ActionKind), UsageRecord>,
    billing_events: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a principal (overwrites any existing row with the same id).
    pub fn insert_principal(&self, snapshot: PrincipalSnapshot) {
        let mut inner = self.lock();
        inner.principals.insert(snapshot.id, snapshot);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl EntitlementStore for MemoryStore {
    async fn load_snapshot(&self, id: Uuid) -> Result<Option<PrincipalSnapshot>, StoreError> {
        Ok(self.lock().principals.get(&id).copied())
    }

    async fn debit_credits(&self, id: Uuid, amount: i64) -> Result<Option<i64>, StoreError> {
        let mut inner = self.lock();
        let Some(principal) = inner.principals.get_mut(&id) else {
            return Ok(None);
        };
        if principal.credits < amount {
            return Ok(None);
        }
        principal.credits -= amount;
        Ok(Some(principal.credits))
    }

    async fn credit_credits(&self, id: Uuid, amount: i64) -> Result<i64, StoreError> {
        let mut inner = self.lock();
        let principal = inner
            .principals
            .get_mut(&id)
            .ok_or(StoreError::PrincipalNotFound(id))?;
        principal.credits += amount;
        Ok(principal.credits)
    }

    async fn set_credit_balance(&self, id: Uuid, balance: i64) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let principal = inner
            .principals
            .get_mut(&id)
            .ok_or(StoreError::PrincipalNotFound(id))?;
        principal.credits = balance;
        Ok(())
    }

    async fn set_plan(&self, id: Uuid, plan: Plan) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let principal = inner
            .principals
            .get_mut(&id)
            .ok_or(StoreError::PrincipalNotFound(id))?;
        principal.plan = plan;
        Ok(())
    }

    async fn reserve_free_generation(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(principal) = inner.principals.get_mut(&id) else {
            return Ok(false);
        };
        if principal.free_generations_used >= principal.free_generations_limit {
            return Ok(false);
        }
        principal.free_generations_used += 1;
        Ok(true)
    }

    async fn load_usage(
        &self,
        id: Uuid,
        kind: ActionKind,
    ) -> Result<Option<UsageRecord>, StoreError> {
        Ok(self.lock().usage.get(&(id, kind)).cloned())
    }

    async fn save_usage(&self, record: &UsageRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner
            .usage
            .insert((record.principal_id, record.action_kind), record.clone());
        Ok(())
    }

    async fn record_billing_event(&self, event_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock().billing_events.insert(event_id.to_owned()))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
