//! Quality tiers and the pure tier resolver.
//!
//! DESIGN
//! ======
//! A generation request runs at exactly one quality tier. The resolver is a
//! pure function over a principal snapshot: no I/O, no caching, re-evaluated
//! on every request because credit balances and trial counters move between
//! calls. Budget reservation (the actual debit) happens afterwards in the
//! entitlement gate via a conditional update, so a stale snapshot can only
//! ever cause a clean denial, never a double spend.

use serde::{Deserialize, Serialize};

use crate::store::PrincipalSnapshot;

// =============================================================================
// PLAN
// =============================================================================

/// Subscription plan attached to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Basic,
    Professional,
    Enterprise,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown plan: {0}")]
pub struct ParsePlanError(pub String);

impl std::str::FromStr for Plan {
    type Err = ParsePlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "professional" => Ok(Self::Professional),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(ParsePlanError(other.to_owned())),
        }
    }
}

impl Plan {
    /// Stable string form persisted in the `principals.plan` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TIER
// =============================================================================

/// Quality tier a generation runs at. Fixed configuration, not per-principal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Starter,
    Basic,
    Professional,
    Enterprise,
}

impl Tier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Basic => "basic",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }

    /// Fixed generation parameters for this tier.
    #[must_use]
    pub fn params(self) -> &'static TierParams {
        match self {
            Self::Starter => &STARTER_PARAMS,
            Self::Basic => &BASIC_PARAMS,
            Self::Professional => &PROFESSIONAL_PARAMS,
            Self::Enterprise => &ENTERPRISE_PARAMS,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-tier generation parameters.
#[derive(Debug, Clone, Copy)]
pub struct TierParams {
    /// Output budget passed to the generation provider.
    pub max_output_tokens: u32,
    /// Sampling temperature for the generation provider.
    pub creativity: f32,
    /// Number of palette colors the design system may include.
    pub color_count: u8,
    /// Number of font pairings the design system may include.
    pub font_pairings: u8,
}

const STARTER_PARAMS: TierParams =
    TierParams { max_output_tokens: 1024, creativity: 0.5, color_count: 4, font_pairings: 1 };
const BASIC_PARAMS: TierParams =
    TierParams { max_output_tokens: 2048, creativity: 0.6, color_count: 6, font_pairings: 2 };
const PROFESSIONAL_PARAMS: TierParams =
    TierParams { max_output_tokens: 4096, creativity: 0.7, color_count: 8, font_pairings: 3 };
const ENTERPRISE_PARAMS: TierParams =
    TierParams { max_output_tokens: 8192, creativity: 0.8, color_count: 12, font_pairings: 4 };

// =============================================================================
// RESOLVER
// =============================================================================

/// What a granted tier will cost when the gate reserves budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cost {
    /// Nothing is consumed (admin override).
    None,
    /// One credit is debited from the principal's balance.
    Credit,
    /// One free-trial generation is consumed.
    FreeGeneration,
}

/// Resolver verdict: the tier to run at and what it costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierGrant {
    pub tier: Tier,
    pub cost: Cost,
}

impl TierGrant {
    /// Credits this grant will debit (0 or 1).
    #[must_use]
    pub fn credits_consumed(self) -> u32 {
        u32::from(self.cost == Cost::Credit)
    }
}

/// The principal has no remaining budget on any branch.
#[derive(Debug, thiserror::Error)]
#[error("out of free trials and credits")]
pub struct NoAccess;

/// Map a principal snapshot to a tier and cost. First match wins:
///
/// 1. admin → enterprise, free
/// 2. enterprise plan with credits → enterprise, 1 credit
/// 3. professional plan with credits → professional, 1 credit
/// 4. basic plan with credits → basic, 1 credit
/// 5. free-trial generations remaining → starter, 1 trial
/// 6. otherwise → [`NoAccess`]
///
/// # Errors
///
/// Returns [`NoAccess`] when every branch is exhausted.
pub fn resolve(snapshot: &PrincipalSnapshot) -> Result<TierGrant, NoAccess> {
    if snapshot.is_admin {
        return Ok(TierGrant { tier: Tier::Enterprise, cost: Cost::None });
    }
    if snapshot.credits > 0 {
        match snapshot.plan {
            Plan::Enterprise => return Ok(TierGrant { tier: Tier::Enterprise, cost: Cost::Credit }),
            Plan::Professional => {
                return Ok(TierGrant { tier: Tier::Professional, cost: Cost::Credit });
            }
            Plan::Basic => return Ok(TierGrant { tier: Tier::Basic, cost: Cost::Credit }),
            Plan::Free => {}
        }
    }
    if snapshot.free_generations_used < snapshot.free_generations_limit {
        return Ok(TierGrant { tier: Tier::Starter, cost: Cost::FreeGeneration });
    }
    Err(NoAccess)
}

#[cfg(test)]
#[path = "tiers_test.rs"]
mod tests;
