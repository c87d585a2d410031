//! Session token issuing and verification.
//!
//! Tokens are HS256 JWTs carrying the user id as subject plus a fresh `jti`
//! used as the revocation key. Verification checks the signature before any
//! claim, so garbage tokens never reach the revocation lookup.

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use super::state::AuthConfig;

const ISSUER: &str = "larder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Why a presented token was not honored.
///
/// Each variant carries the fixed client-facing message; all of them map to
/// HTTP 401.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("No user is currently logged in. Please provide a bearer token")]
    Missing,
    #[error("Invalid token. Please log in again")]
    Invalid,
    #[error("Token has expired. Please log in again")]
    Expired,
    #[error("Token has been revoked. Please log in again")]
    Revoked,
}

impl IntoResponse for TokenRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Mint a signed token for a freshly authenticated user.
///
/// # Errors
///
/// Returns an error if claim serialization or signing fails.
pub fn issue(config: &AuthConfig, user_id: i64) -> anyhow::Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        iss: ISSUER.to_string(),
        sub: user_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp: now + config.token_ttl_seconds(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.token_secret()),
    )?;

    Ok(token)
}

/// Verify signature, issuer, and expiry, returning the embedded claims.
///
/// Revocation is a separate persisted check; see `principal::require_auth`.
///
/// # Errors
///
/// `Expired` when the embedded expiry has passed, `Invalid` for everything
/// else (bad signature, malformed token, wrong issuer).
pub fn verify(config: &AuthConfig, token: &str) -> Result<Claims, TokenRejection> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.token_secret()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenRejection::Expired,
        _ => TokenRejection::Invalid,
    })
}

/// Pull the bearer token out of the `Authorization` header, if any.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    fn test_config() -> AuthConfig {
        AuthConfig::new(SecretString::from("test-signing-secret".to_string()))
    }

    #[test]
    fn issue_then_verify_resolves_the_subject() -> anyhow::Result<()> {
        let config = test_config();
        let token = issue(&config, 42)?;
        let claims = verify(&config, &token).expect("fresh token should verify");
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, config.token_ttl_seconds());
        Ok(())
    }

    #[test]
    fn each_token_gets_a_fresh_jti() -> anyhow::Result<()> {
        let config = test_config();
        let first = verify(&config, &issue(&config, 1)?).expect("should verify");
        let second = verify(&config, &issue(&config, 1)?).expect("should verify");
        assert_ne!(first.jti, second.jti);
        Ok(())
    }

    #[test]
    fn garbage_tokens_are_invalid() {
        let config = test_config();
        assert_eq!(
            verify(&config, "not.a.token"),
            Err(TokenRejection::Invalid)
        );
    }

    #[test]
    fn wrong_secret_is_invalid_not_expired() -> anyhow::Result<()> {
        let token = issue(&test_config(), 7)?;
        let other = AuthConfig::new(SecretString::from("different-secret".to_string()));
        assert_eq!(verify(&other, &token), Err(TokenRejection::Invalid));
        Ok(())
    }

    #[test]
    fn elapsed_expiry_is_reported_as_expired() {
        let config = test_config();
        // Hand-roll a token whose expiry is far in the past (beyond the
        // verifier's leeway), signed with the right secret.
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: "7".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.token_secret()),
        )
        .expect("encoding should succeed");

        assert_eq!(verify(&config, &token), Err(TokenRejection::Expired));
    }

    #[test]
    fn bearer_extraction_handles_casing_and_whitespace() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static(" bearer abc123 "));
        assert_eq!(bearer_token(&headers), Some("abc123".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn rejection_messages_are_fixed_per_cause() {
        assert_eq!(
            TokenRejection::Missing.to_string(),
            "No user is currently logged in. Please provide a bearer token"
        );
        assert_eq!(
            TokenRejection::Revoked.to_string(),
            "Token has been revoked. Please log in again"
        );
    }
}
