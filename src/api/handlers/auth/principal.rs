//! Resolving the calling user on protected routes.

use axum::{http::HeaderMap, http::StatusCode, response::IntoResponse, response::Response};
use sqlx::PgPool;
use tracing::error;

use super::super::{fail, server_error};
use super::{revocation, state::AuthConfig, storage, storage::UserRecord, token};

/// The authenticated caller plus the jti of the token they presented.
pub(crate) struct Principal {
    pub(crate) user: UserRecord,
    pub(crate) jti: String,
}

/// Run the full session gate: bearer extraction, signature/expiry check,
/// revocation lookup, then subject resolution.
///
/// # Errors
///
/// Returns the ready-to-send rejection response: 401 for every token failure
/// (missing, invalid, expired, revoked), 404 when the subject user no longer
/// exists, 500 when a lookup itself fails.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    config: &AuthConfig,
) -> Result<Principal, Response> {
    let Some(token) = token::bearer_token(headers) else {
        return Err(token::TokenRejection::Missing.into_response());
    };

    let claims = token::verify(config, &token).map_err(IntoResponse::into_response)?;

    match revocation::is_revoked(pool, &claims.jti).await {
        Ok(false) => {}
        Ok(true) => return Err(token::TokenRejection::Revoked.into_response()),
        Err(err) => {
            error!("Failed to check token revocation: {err}");
            return Err(server_error());
        }
    }

    let Ok(user_id) = claims.sub.parse::<i64>() else {
        return Err(token::TokenRejection::Invalid.into_response());
    };

    match storage::lookup_user_by_id(pool, user_id).await {
        Ok(Some(user)) => Ok(Principal {
            user,
            jti: claims.jti,
        }),
        // The subject was deleted out from under a live token.
        Ok(None) => Err(fail(StatusCode::NOT_FOUND, "User no longer exists")),
        Err(err) => {
            error!("Failed to resolve token subject: {err}");
            Err(server_error())
        }
    }
}
