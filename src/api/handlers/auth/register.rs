//! User registration.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::super::{fail, reply_with, server_error};
use super::{password, state::AuthConfig, storage, storage::RegisterOutcome};
use crate::validation::{rules, validate, FieldKind, FieldSpec};

const DUPLICATE_USERNAME: &str = "Username already taken. Usernames are case-insensitive";
const DUPLICATE_EMAIL: &str = "Email already taken";

const REGISTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("username", FieldKind::Text).check(rules::username),
    FieldSpec::required("password", FieldKind::Text).check(rules::password),
    FieldSpec::required("email", FieldKind::Text).check(rules::email),
    FieldSpec::required("security_answer", FieldKind::Text).check(rules::security_answer),
];

#[utoipa::path(
    post,
    path = "/users/register",
    request_body = super::types::RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = super::types::RegisterResponse),
        (status = 400, description = "Validation failure or duplicate username/email", body = super::types::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn register(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    body: String,
) -> impl IntoResponse {
    let data = match validate(&body, REGISTER_FIELDS) {
        Ok(data) => data,
        Err(failure) => return failure.into_response(),
    };
    let (Some(username), Some(raw_password), Some(email), Some(answer)) = (
        data.text("username"),
        data.text("password"),
        data.text("email"),
        data.text("security_answer"),
    ) else {
        return server_error();
    };

    // Best-effort pre-checks give the friendly answers; the UNIQUE
    // constraints settle concurrent registrations below.
    match storage::lookup_user_by_username(&pool, username).await {
        Ok(None) => {}
        Ok(Some(_)) => return fail(StatusCode::BAD_REQUEST, DUPLICATE_USERNAME),
        Err(err) => {
            error!("Failed to check username uniqueness: {err}");
            return server_error();
        }
    }
    match storage::email_taken(&pool, email).await {
        Ok(false) => {}
        Ok(true) => return fail(StatusCode::BAD_REQUEST, DUPLICATE_EMAIL),
        Err(err) => {
            error!("Failed to check email uniqueness: {err}");
            return server_error();
        }
    }

    let password_hash = match password::hash_secret(raw_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return server_error();
        }
    };
    let answer_hash = match password::hash_secret(answer) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash security answer: {err}");
            return server_error();
        }
    };

    match storage::insert_user_with_pantry(
        &pool,
        username,
        email,
        &password_hash,
        config.security_question(),
        &answer_hash,
    )
    .await
    {
        Ok(RegisterOutcome::Created) => reply_with(
            StatusCode::CREATED,
            "User registered successfully",
            json!({ "user": { "username": username, "email": email } }),
        ),
        Ok(RegisterOutcome::DuplicateUsername) => fail(StatusCode::BAD_REQUEST, DUPLICATE_USERNAME),
        Ok(RegisterOutcome::DuplicateEmail) => fail(StatusCode::BAD_REQUEST, DUPLICATE_EMAIL),
        Err(err) => {
            error!("Failed to register user: {err}");
            server_error()
        }
    }
}
