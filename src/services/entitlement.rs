//! Entitlement gate — the single authorization point for generations.
//!
//! DESIGN
//! ======
//! Per-request state machine: rate check → principal validation → pure tier
//! resolution → atomic budget reservation → grant. Any gate can exit early
//! with a denial. The resolver's optimistic read and the reservation are
//! collapsed into a conditional single-step update in the store, so a race
//! between two concurrent requests can only produce one winner and one clean
//! `NoCredits` — never a negative balance.
//!
//! FAILURE SEMANTICS
//! =================
//! Internal errors from the store deny the request (fail closed): billing
//! correctness beats availability. The in-process rate limiter is the one
//! deliberate exception — it recovers poisoned locks rather than denying,
//! because throttling prefers availability.

use tracing::{info, warn};
use uuid::Uuid;

use crate::rate_limit::{self, RateLimitError, RateLimiter};
use crate::store::{EntitlementStore, PrincipalSnapshot, StoreError};
use crate::tiers::{self, Cost, Tier};

use super::session;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EntitlementError {
    #[error("rate limited, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("out of free trials and credits — purchase a plan to continue")]
    NoCredits,
    #[error("unknown or suspended account")]
    InvalidPrincipal,
    #[error("internal error: {0}")]
    Internal(String),
}

impl crate::errors::ErrorCode for EntitlementError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "E_RATE_LIMITED",
            Self::NoCredits => "E_NO_CREDITS",
            Self::InvalidPrincipal => "E_INVALID_PRINCIPAL",
            Self::Internal(_) => "E_INTERNAL",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl From<RateLimitError> for EntitlementError {
    fn from(e: RateLimitError) -> Self {
        Self::RateLimited { retry_after_secs: e.retry_after_secs() }
    }
}

impl From<StoreError> for EntitlementError {
    fn from(e: StoreError) -> Self {
        // Fail closed: a storage failure never becomes a grant.
        Self::Internal(e.to_string())
    }
}

/// Authorization for exactly one generation at the resolved tier.
#[derive(Debug, Clone)]
pub struct GenerationGrant {
    pub tier: Tier,
    pub credits_consumed: u32,
    /// Opaque commit token identifying this grant in logs and responses.
    pub grant_token: String,
}

// =============================================================================
// GATE
// =============================================================================

/// Run the full gate for one generation request.
///
/// # Errors
///
/// Returns a [`EntitlementError`] denial; callers above never see raw
/// store errors.
pub async fn authorize(
    limiter: &RateLimiter,
    store: &dyn EntitlementStore,
    principal_id: Uuid,
) -> Result<GenerationGrant, EntitlementError> {
    let (limit, window) = rate_limit::authenticated_ceiling();
    limiter.check_and_consume(&principal_id.to_string(), limit, window)?;

    let snapshot = fetch_valid_snapshot(store, principal_id).await?;
    resolve_and_reserve(store, &snapshot).await
}

/// Load a snapshot and reject missing or banned principals.
pub(crate) async fn fetch_valid_snapshot(
    store: &dyn EntitlementStore,
    principal_id: Uuid,
) -> Result<PrincipalSnapshot, EntitlementError> {
    let snapshot = store
        .load_snapshot(principal_id)
        .await?
        .ok_or(EntitlementError::InvalidPrincipal)?;
    if snapshot.banned {
        warn!(%principal_id, "entitlement: banned principal denied");
        return Err(EntitlementError::InvalidPrincipal);
    }
    Ok(snapshot)
}

/// Resolve the tier and atomically reserve its budget.
///
/// The snapshot read is optimistic; the reservation re-checks the budget in
/// a conditional update. Losing that race is surfaced as `NoCredits` but
/// logged distinctly so optimistic-check races stay diagnosable.
pub(crate) async fn resolve_and_reserve(
    store: &dyn EntitlementStore,
    snapshot: &PrincipalSnapshot,
) -> Result<GenerationGrant, EntitlementError> {
    let grant = tiers::resolve(snapshot).map_err(|_| EntitlementError::NoCredits)?;

    match grant.cost {
        Cost::Credit => match store.debit_credits(snapshot.id, 1).await? {
            Some(balance) => {
                info!(principal_id = %snapshot.id, tier = %grant.tier, balance, "entitlement: credit debited");
            }
            None => {
                warn!(principal_id = %snapshot.id, "entitlement: debit race lost after optimistic resolve");
                return Err(EntitlementError::NoCredits);
            }
        },
        Cost::FreeGeneration => {
            if !store.reserve_free_generation(snapshot.id).await? {
                warn!(principal_id = %snapshot.id, "entitlement: free-trial race lost after optimistic resolve");
                return Err(EntitlementError::NoCredits);
            }
            info!(principal_id = %snapshot.id, "entitlement: free-trial generation reserved");
        }
        Cost::None => {
            info!(principal_id = %snapshot.id, tier = %grant.tier, "entitlement: admin override, no budget consumed");
        }
    }

    Ok(GenerationGrant {
        tier: grant.tier,
        credits_consumed: grant.credits_consumed(),
        grant_token: session::generate_token(),
    })
}

#[cfg(test)]
#[path = "entitlement_test.rs"]
mod tests;
