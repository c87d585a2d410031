//! Logout: revoke the presented token's identifier.

use axum::{extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::super::{reply, server_error};
use super::{principal::require_auth, revocation, state::AuthConfig};

#[utoipa::path(
    post,
    path = "/users/logout",
    responses(
        (status = 200, description = "Token revoked", body = super::types::MessageResponse),
        (status = 401, description = "Missing, invalid, expired, or already revoked token", body = super::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    // An expired or invalid token is turned away here; only a currently
    // active token reaches the ledger.
    let principal = match require_auth(&headers, &pool, &config).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match revocation::revoke(&pool, &principal.jti).await {
        Ok(()) => reply(
            StatusCode::OK,
            &format!("User {} logged out successfully", principal.user.username),
        ),
        Err(err) => {
            error!("Failed to revoke token: {err}");
            server_error()
        }
    }
}
