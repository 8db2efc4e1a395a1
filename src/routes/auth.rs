//! Auth routes — bearer-token sessions over the external identity seam.
//!
//! The login endpoint is the demo/dev identity path: it upserts a principal
//! by email and issues a session token. Production deployments front this
//! with a real identity provider; everything downstream only ever sees a
//! resolved principal id.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::rate_limit;
use crate::services::session;
use crate::state::AppState;

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated principal extracted from the `Authorization: Bearer` header.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub principal: session::SessionPrincipal,
    pub token: String,
}

fn bearer_token(parts: &axum::http::request::Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(StatusCode::UNAUTHORIZED);
        };

        let app_state = AppState::from_ref(state);
        let principal = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { principal, token: token.to_owned() })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
}

/// Client identity for the anonymous rate limiter: proxy-forwarded IP when
/// present, otherwise a shared bucket.
fn client_identity(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_owned())
        .unwrap_or_else(|| "anon".to_owned())
}

/// `POST /api/auth/login` — upsert a principal by email and issue a session
/// token. Anonymous, so throttled at the IP-keyed ceiling.
pub async fn login(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let (limit, window) = rate_limit::anonymous_ceiling();
    if state
        .rate_limiter
        .check_and_consume(&client_identity(&headers), limit, window)
        .is_err()
    {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    let email = body.email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(StatusCode::BAD_REQUEST);
    }

    let principal_id = session::upsert_principal(&state.pool, &email)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let token = session::create_session(&state.pool, principal_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(serde_json::json!({ "token": token, "principal_id": principal_id })))
}

/// `POST /api/auth/logout` — delete the current session.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    match session::delete_session(&state.pool, &auth.token).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `GET /api/auth/me` — return the current principal.
pub async fn me(auth: AuthUser) -> Json<session::SessionPrincipal> {
    Json(auth.principal)
}
