//! Usage and credit status routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use super::auth::AuthUser;
use crate::services::usage::{self, UsageStatus};
use crate::store::ActionKind;
use crate::state::AppState;

/// `GET /api/usage` — monthly generation counter for the current principal.
pub async fn usage_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UsageStatus>, StatusCode> {
    let snapshot = state
        .store
        .load_snapshot(auth.principal.id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::FORBIDDEN)?;

    let record = usage::get_usage(state.store.as_ref(), auth.principal.id, ActionKind::Generation)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(UsageStatus::from_record(&record, usage::monthly_limit(snapshot.plan))))
}

/// `GET /api/credits` — prepaid balance and plan for the current principal.
pub async fn credit_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let snapshot = state
        .store
        .load_snapshot(auth.principal.id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::FORBIDDEN)?;

    Ok(Json(serde_json::json!({
        "balance": snapshot.credits,
        "plan": snapshot.plan,
    })))
}
