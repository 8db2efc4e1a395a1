//! Payment-processor webhook route.
//!
//! Verifies the shared-secret signature over the raw body before parsing,
//! then applies the event idempotently. Replays return 200 so the processor
//! stops redelivering.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use tracing::warn;

use crate::services::billing::{self, BillingError, BillingOutcome, PaymentEvent};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-billing-signature";

fn webhook_secret() -> Option<String> {
    std::env::var("BILLING_WEBHOOK_SECRET").ok()
}

/// `POST /api/webhooks/payment` — apply a payment event.
pub async fn payment(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(secret) = webhook_secret() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "billing webhook not configured").into_response();
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !billing::verify_signature(&secret, &body, signature) {
        warn!("webhook: bad signature rejected");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let event: PaymentEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("invalid event: {e}")).into_response();
        }
    };

    match billing::apply_payment_event(state.store.as_ref(), &event).await {
        Ok(BillingOutcome::Applied { new_balance }) => {
            Json(serde_json::json!({ "applied": true, "new_balance": new_balance })).into_response()
        }
        Ok(BillingOutcome::Duplicate) => {
            Json(serde_json::json!({ "applied": false, "duplicate": true })).into_response()
        }
        Err(BillingError::InvalidGrant(amount)) => {
            (StatusCode::BAD_REQUEST, format!("invalid credit grant: {amount}")).into_response()
        }
        Err(BillingError::Store(e)) => {
            warn!(error = %e, "webhook: store failure applying event");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
