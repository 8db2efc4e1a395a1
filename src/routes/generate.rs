//! Generation routes — full flow and authorize-only.
//!
//! Denial responses always carry a machine-readable reason code and a human
//! message; there is no partial success (a full grant/payload or a clean
//! denial, nothing in between).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::auth::AuthUser;
use crate::errors::ErrorCode;
use crate::generator::types::DesignBrief;
use crate::services::entitlement::{self, EntitlementError};
use crate::services::generate::{self, GenerateError};
use crate::state::AppState;

// =============================================================================
// DENIAL MAPPING
// =============================================================================

fn denial_status(err: &EntitlementError) -> StatusCode {
    match err {
        EntitlementError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        EntitlementError::NoCredits => StatusCode::PAYMENT_REQUIRED,
        EntitlementError::InvalidPrincipal => StatusCode::FORBIDDEN,
        EntitlementError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn denial_body(err: &EntitlementError) -> serde_json::Value {
    let mut denied = serde_json::json!({
        "reason": err.error_code(),
        "message": err.to_string(),
    });
    if let EntitlementError::RateLimited { retry_after_secs } = err {
        denied["retry_after_seconds"] = serde_json::json!(retry_after_secs);
    }
    serde_json::json!({ "denied": denied })
}

fn denial_response(err: &EntitlementError) -> Response {
    (denial_status(err), Json(denial_body(err))).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/generate/authorize` — run the entitlement gate only. On
/// success the caller holds authorization for exactly one generation.
pub async fn authorize(State(state): State<AppState>, auth: AuthUser) -> Response {
    match entitlement::authorize(&state.rate_limiter, state.store.as_ref(), auth.principal.id)
        .await
    {
        Ok(grant) => Json(serde_json::json!({
            "granted": {
                "tier": grant.tier,
                "grant_token": grant.grant_token,
                "credits_consumed": grant.credits_consumed,
            }
        }))
        .into_response(),
        Err(e) => denial_response(&e),
    }
}

/// `POST /api/generate` — gate, cache, provider call, accounting.
pub async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(brief): Json<DesignBrief>,
) -> Response {
    if brief.brand_description.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "denied": { "reason": "E_EMPTY_BRIEF", "message": "brand description is required" }
            })),
        )
            .into_response();
    }

    match generate::handle_generate(&state, auth.principal.id, &brief).await {
        Ok(outcome) => Json(serde_json::json!({
            "design": outcome.payload,
            "tier": outcome.tier,
            "credits_consumed": outcome.credits_consumed,
            "cached": outcome.cached,
        }))
        .into_response(),
        Err(GenerateError::Denied(e)) => denial_response(&e),
        Err(e @ GenerateError::GeneratorNotConfigured) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "denied": { "reason": e.error_code(), "message": e.to_string() }
            })),
        )
            .into_response(),
        Err(e @ GenerateError::Generator(_)) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "denied": {
                    "reason": e.error_code(),
                    "message": e.to_string(),
                    "retryable": e.retryable(),
                }
            })),
        )
            .into_response(),
    }
}
