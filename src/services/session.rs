//! Session-token management for HTTP auth.
//!
//! The identity provider proper is external; sessions are the narrow
//! interface through which routes resolve the current principal id. Tokens
//! are opaque random hex, stored server-side with an expiry.

use std::fmt::Write;

use rand::Rng;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Principal identity resolved from a session token.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionPrincipal {
    pub id: Uuid,
    pub email: String,
    pub plan: String,
}

/// Create a session for the given principal, returning the token.
pub async fn create_session(pool: &PgPool, principal_id: Uuid) -> Result<String, sqlx::Error> {
    let token = generate_token();
    sqlx::query("INSERT INTO sessions (token, principal_id) VALUES ($1, $2)")
        .bind(&token)
        .bind(principal_id)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Validate a session token and return the associated principal.
pub async fn validate_session(
    pool: &PgPool,
    token: &str,
) -> Result<Option<SessionPrincipal>, sqlx::Error> {
    let row = sqlx::query(
        r"SELECT p.id, p.email, p.plan
          FROM sessions s
          JOIN principals p ON p.id = s.principal_id
          WHERE s.token = $1 AND s.expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| SessionPrincipal { id: r.get("id"), email: r.get("email"), plan: r.get("plan") }))
}

/// Delete a session by token.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Upsert a principal by email (demo login path). Returns the principal id.
pub async fn upsert_principal(pool: &PgPool, email: &str) -> Result<Uuid, sqlx::Error> {
    let row = sqlx::query(
        r"INSERT INTO principals (email)
          VALUES ($1)
          ON CONFLICT (email) DO UPDATE SET updated_at = now()
          RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(row.get("id"))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
