//! Persisted ledger of revoked token identifiers.
//!
//! A jti lands here on logout and never leaves; any token carrying a listed
//! jti is rejected no matter how valid its signature and expiry are.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

/// Record a token identifier as no longer valid.
///
/// Insert-or-ignore semantics: revoking the same jti twice, or concurrently,
/// is harmless.
pub async fn revoke(pool: &PgPool, jti: &str) -> Result<()> {
    let query = "INSERT INTO revoked_tokens (jti) VALUES ($1) ON CONFLICT (jti) DO NOTHING";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(jti)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to record revoked token")?;
    Ok(())
}

/// Point lookup used by the session gate on every protected request.
pub async fn is_revoked(pool: &PgPool, jti: &str) -> Result<bool> {
    let query = "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1) AS revoked";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(jti)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check revoked token")?;
    Ok(row.get("revoked"))
}
