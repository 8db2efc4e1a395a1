//! Payment-webhook application — plan changes and credit grants.
//!
//! DESIGN
//! ======
//! The payment processor delivers events at-least-once; each carries a unique
//! event id. The event id is claimed in the store before any mutation, so a
//! replayed delivery observes the claim and becomes a no-op. Credits and plan
//! changes only ever enter the system through this path (and admin override),
//! never through the generation path itself.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::store::{EntitlementStore, StoreError};
use crate::tiers::Plan;

/// Credit balance a principal falls back to on cancellation.
const CANCELLATION_FLOOR: i64 = 0;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Purchase,
    Renewal,
    Cancellation,
}

/// Normalized webhook event from the payment processor.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
    /// Processor-assigned unique id; the idempotency key.
    pub event_id: String,
    pub principal_id: Uuid,
    pub kind: PaymentKind,
    pub plan: Plan,
    /// Credits granted by a purchase or renewal. Ignored for cancellations.
    #[serde(default)]
    pub credit_grant: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("invalid credit grant: {0}")]
    InvalidGrant(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of applying a webhook event.
#[derive(Debug, PartialEq, Eq)]
pub enum BillingOutcome {
    Applied { new_balance: i64 },
    /// The event id was seen before; nothing changed.
    Duplicate,
}

// =============================================================================
// APPLICATION
// =============================================================================

/// Apply a payment event idempotently.
///
/// # Errors
///
/// Rejects negative credit grants; propagates storage failures.
pub async fn apply_payment_event(
    store: &dyn EntitlementStore,
    event: &PaymentEvent,
) -> Result<BillingOutcome, BillingError> {
    if event.credit_grant < 0 {
        return Err(BillingError::InvalidGrant(event.credit_grant));
    }

    // Claim the event id first; a replay stops here.
    if !store.record_billing_event(&event.event_id).await? {
        info!(event_id = %event.event_id, "billing: duplicate event ignored");
        return Ok(BillingOutcome::Duplicate);
    }

    let new_balance = match event.kind {
        PaymentKind::Purchase | PaymentKind::Renewal => {
            store.set_plan(event.principal_id, event.plan).await?;
            store
                .credit_credits(event.principal_id, event.credit_grant)
                .await?
        }
        PaymentKind::Cancellation => {
            store.set_plan(event.principal_id, Plan::Free).await?;
            store
                .set_credit_balance(event.principal_id, CANCELLATION_FLOOR)
                .await?;
            CANCELLATION_FLOOR
        }
    };

    info!(
        event_id = %event.event_id,
        principal_id = %event.principal_id,
        kind = ?event.kind,
        plan = %event.plan,
        new_balance,
        "billing: event applied"
    );
    Ok(BillingOutcome::Applied { new_balance })
}

// =============================================================================
// SIGNATURE
// =============================================================================

/// Expected signature for a webhook body: hex SHA-256 over `secret || body`.
#[must_use]
pub fn expected_signature(secret: &str, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(body);
    let bytes = hasher.finalize();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Verify a webhook signature header against the raw body.
#[must_use]
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let expected = expected_signature(secret, body);
    let provided = signature.trim().to_ascii_lowercase();
    constant_time_eq(expected.as_bytes(), provided.as_bytes())
}

/// Comparison time must not depend on where the first mismatch falls.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
#[path = "billing_test.rs"]
mod tests;
