//! Login: credential check and token issuance.

use axum::{
    extract::Extension,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::super::{fail, server_error};
use super::{password, state::AuthConfig, storage, token};
use crate::validation::{validate, FieldKind, FieldSpec};

// One message for both a missing user and a wrong password; the response
// must not reveal which check failed.
const INVALID_CREDENTIALS: &str = "Invalid username or password";

const LOGIN_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("username", FieldKind::Text),
    FieldSpec::required("password", FieldKind::Text),
];

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = super::types::LoginRequest,
    responses(
        (status = 200, description = "Login successful; the token is also set as the Authorization response header", body = super::types::LoginResponse),
        (status = 400, description = "Validation failure or invalid credentials", body = super::types::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn login(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    body: String,
) -> impl IntoResponse {
    let data = match validate(&body, LOGIN_FIELDS) {
        Ok(data) => data,
        Err(failure) => return failure.into_response(),
    };
    let (Some(username), Some(candidate)) = (data.text("username"), data.text("password")) else {
        return server_error();
    };
    let username = username.to_lowercase();

    let user = match storage::lookup_user_by_username(&pool, &username).await {
        Ok(user) => user,
        Err(err) => {
            error!("Failed to lookup user for login: {err}");
            return server_error();
        }
    };

    // Verify only when the user exists; either failure collapses into the
    // same generic rejection.
    let authenticated = match &user {
        Some(user) => match password::verify_secret(&user.password_hash, candidate) {
            Ok(verified) => verified,
            Err(err) => {
                error!("Failed to verify password: {err}");
                return server_error();
            }
        },
        None => false,
    };
    let Some(user) = user.filter(|_| authenticated) else {
        return fail(StatusCode::BAD_REQUEST, INVALID_CREDENTIALS);
    };

    let access_token = match token::issue(&config, user.id) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return server_error();
        }
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = format!("Bearer {access_token}").parse() {
        headers.insert(AUTHORIZATION, value);
    }

    let body = Json(json!({
        "message": format!("Login successful with {username}"),
        "access_token": access_token,
    }));
    (StatusCode::OK, headers, body).into_response()
}
