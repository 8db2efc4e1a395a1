//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the generation, status, auth, and billing-webhook endpoints into a
//! single Axum router. The entitlement gate lives behind these handlers;
//! routes only translate protocol and map denials to status codes.

pub mod auth;
pub mod generate;
pub mod status;
pub mod webhook;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/generate", post(generate::generate))
        .route("/api/generate/authorize", post(generate::authorize))
        .route("/api/usage", get(status::usage_status))
        .route("/api/credits", get(status::credit_status))
        .route("/api/webhooks/payment", post(webhook::payment))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
