//! Full generation flow: gate → cache → generator → accounting.
//!
//! DESIGN
//! ======
//! Ordering per request: rate check (authenticated ceiling) → principal
//! validation → cache probe → on miss: atomic resolve-and-reserve → provider
//! call → advisory monthly usage increment → cache fill. A cache hit spends
//! nothing and skips the provider.
//!
//! TRADE-OFFS
//! ==========
//! A provider failure after the debit does not refund the credit; the
//! distinct `generation failed after budget reserved` log line is the hook
//! for operator compensation. The usage increment is advisory and can never
//! fail the response — its errors are logged and swallowed.

use tracing::{info, warn};
use uuid::Uuid;

use crate::cache;
use crate::errors::ErrorCode;
use crate::generator::types::{DesignBrief, DesignPayload, GeneratorError};
use crate::rate_limit;
use crate::state::AppState;
use crate::store::ActionKind;
use crate::tiers::Tier;

use super::entitlement::{self, EntitlementError};
use super::usage;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Denied(#[from] EntitlementError),
    #[error("generator not configured")]
    GeneratorNotConfigured,
    #[error("generation failed: {0}")]
    Generator(#[from] GeneratorError),
}

impl crate::errors::ErrorCode for GenerateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Denied(e) => e.error_code(),
            Self::GeneratorNotConfigured => "E_GENERATOR_NOT_CONFIGURED",
            Self::Generator(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Denied(e) => e.retryable(),
            Self::GeneratorNotConfigured => false,
            Self::Generator(e) => e.retryable(),
        }
    }
}

/// Outcome of a generation request.
#[derive(Debug)]
pub struct GenerateOutcome {
    pub payload: DesignPayload,
    pub tier: Tier,
    pub credits_consumed: u32,
    pub cached: bool,
}

// =============================================================================
// FLOW
// =============================================================================

/// Handle one authenticated generation request end to end.
///
/// # Errors
///
/// Returns a denial from the entitlement gate, or a generator error once
/// budget has been reserved.
pub async fn handle_generate(
    state: &AppState,
    principal_id: Uuid,
    brief: &DesignBrief,
) -> Result<GenerateOutcome, GenerateError> {
    let (limit, window) = rate_limit::authenticated_ceiling();
    state
        .rate_limiter
        .check_and_consume(&principal_id.to_string(), limit, window)
        .map_err(EntitlementError::from)?;

    // Refuse before spending anything if generation is disabled.
    let generator = state
        .generator
        .as_ref()
        .ok_or(GenerateError::GeneratorNotConfigured)?;

    let snapshot = entitlement::fetch_valid_snapshot(state.store.as_ref(), principal_id).await?;

    let key = cache::brief_key(brief);
    if let Some(hit) = state.cache.get(&key) {
        info!(%principal_id, tier = %hit.tier, "generate: cache hit, no budget consumed");
        return Ok(GenerateOutcome {
            payload: hit.payload,
            tier: hit.tier,
            credits_consumed: 0,
            cached: true,
        });
    }

    let grant = entitlement::resolve_and_reserve(state.store.as_ref(), &snapshot).await?;

    let payload = match generator.generate(brief, grant.tier.params()).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(
                %principal_id,
                tier = %grant.tier,
                credits_consumed = grant.credits_consumed,
                error = %e,
                "generate: generation failed after budget reserved"
            );
            return Err(e.into());
        }
    };

    // Advisory monthly count for dashboards; never fails the response.
    if let Err(e) = usage::increment(
        state.store.as_ref(),
        principal_id,
        ActionKind::Generation,
        usage::monthly_limit(snapshot.plan),
    )
    .await
    {
        warn!(%principal_id, error = %e, "generate: usage increment failed");
    }

    state.cache.put(key, payload.clone(), grant.tier);

    info!(
        %principal_id,
        tier = %grant.tier,
        credits_consumed = grant.credits_consumed,
        colors = payload.colors.len(),
        "generate: design system produced"
    );
    Ok(GenerateOutcome {
        payload,
        tier: grant.tier,
        credits_consumed: grant.credits_consumed,
        cached: false,
    })
}

#[cfg(test)]
#[path = "generate_test.rs"]
mod tests;
