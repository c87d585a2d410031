//! Credential recovery and rotation: forgot-password, reset-password, and
//! reset-security-answer.
//!
//! All three flows share the same ordering: prove identity or possession
//! first, then run the semantic rules on the replacement secret, then the
//! confirm-match and no-change checks, and only then write.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::super::{fail, reply, server_error};
use super::{password, principal::require_auth, state::AuthConfig, storage, storage::UserRecord};
use crate::validation::{rules, validate, FieldKind, FieldSpec, FieldValue};

// One message for both an unknown username and a wrong answer.
const INVALID_RECOVERY: &str = "Invalid username or security answer";

const FORGET_PASSWORD_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("username", FieldKind::Text),
    FieldSpec::required("security_answer", FieldKind::Text),
    FieldSpec::required("new_password", FieldKind::Text),
    FieldSpec::required("confirm_password", FieldKind::Text),
];

const RESET_PASSWORD_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("old_password", FieldKind::Text),
    FieldSpec::required("new_password", FieldKind::Text),
    FieldSpec::required("confirm_password", FieldKind::Text),
];

const RESET_ANSWER_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("old_security_answer", FieldKind::Text),
    FieldSpec::required("new_security_answer", FieldKind::Text),
    FieldSpec::required("confirm_security_answer", FieldKind::Text),
];

#[utoipa::path(
    post,
    path = "/users/forget_password",
    request_body = super::types::ForgetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = super::types::MessageResponse),
        (status = 400, description = "Validation failure, mismatch, or unchanged password", body = super::types::ErrorResponse),
        (status = 401, description = "Unknown username or wrong security answer", body = super::types::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn forget_password(
    pool: Extension<PgPool>,
    body: String,
) -> impl IntoResponse {
    let data = match validate(&body, FORGET_PASSWORD_FIELDS) {
        Ok(data) => data,
        Err(failure) => return failure.into_response(),
    };
    let (Some(username), Some(answer), Some(new_password), Some(confirm_password)) = (
        data.text("username"),
        data.text("security_answer"),
        data.text("new_password"),
        data.text("confirm_password"),
    ) else {
        return server_error();
    };
    let username = username.to_lowercase();
    let answer = answer.to_lowercase();

    let user = match storage::lookup_user_by_username(&pool, &username).await {
        Ok(user) => user,
        Err(err) => {
            error!("Failed to lookup user for recovery: {err}");
            return server_error();
        }
    };
    let proven = match &user {
        Some(user) => match password::verify_secret(&user.security_answer, &answer) {
            Ok(verified) => verified,
            Err(err) => {
                error!("Failed to verify security answer: {err}");
                return server_error();
            }
        },
        None => false,
    };
    let Some(user) = user.filter(|_| proven) else {
        return fail(StatusCode::UNAUTHORIZED, INVALID_RECOVERY);
    };

    change_password(&pool, &user, new_password, confirm_password).await
}

#[utoipa::path(
    post,
    path = "/users/reset_password",
    request_body = super::types::ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = super::types::MessageResponse),
        (status = 400, description = "Validation failure, mismatch, or unchanged password", body = super::types::ErrorResponse),
        (status = 401, description = "Token failure or wrong old password", body = super::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn reset_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    body: String,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &config).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let data = match validate(&body, RESET_PASSWORD_FIELDS) {
        Ok(data) => data,
        Err(failure) => return failure.into_response(),
    };
    let (Some(old_password), Some(new_password), Some(confirm_password)) = (
        data.text("old_password"),
        data.text("new_password"),
        data.text("confirm_password"),
    ) else {
        return server_error();
    };

    match password::verify_secret(&principal.user.password_hash, old_password) {
        Ok(true) => {}
        Ok(false) => return fail(StatusCode::UNAUTHORIZED, "Invalid old password"),
        Err(err) => {
            error!("Failed to verify old password: {err}");
            return server_error();
        }
    }

    change_password(&pool, &principal.user, new_password, confirm_password).await
}

#[utoipa::path(
    post,
    path = "/users/reset_security_answer",
    request_body = super::types::ResetSecurityAnswerRequest,
    responses(
        (status = 200, description = "Security answer replaced", body = super::types::MessageResponse),
        (status = 400, description = "Validation failure, mismatch, or unchanged answer", body = super::types::ErrorResponse),
        (status = 401, description = "Token failure or wrong old answer", body = super::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn reset_security_answer(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    body: String,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &config).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let data = match validate(&body, RESET_ANSWER_FIELDS) {
        Ok(data) => data,
        Err(failure) => return failure.into_response(),
    };
    let (Some(old_answer), Some(new_answer), Some(confirm_answer)) = (
        data.text("old_security_answer"),
        data.text("new_security_answer"),
        data.text("confirm_security_answer"),
    ) else {
        return server_error();
    };
    // Answers are case-insensitive throughout.
    let old_answer = old_answer.to_lowercase();
    let confirm_answer = confirm_answer.to_lowercase();

    match password::verify_secret(&principal.user.security_answer, &old_answer) {
        Ok(true) => {}
        Ok(false) => return fail(StatusCode::UNAUTHORIZED, "Invalid old security answer"),
        Err(err) => {
            error!("Failed to verify old security answer: {err}");
            return server_error();
        }
    }

    let new_answer = match checked_replacement(
        "new_security_answer",
        rules::security_answer,
        new_answer,
    ) {
        Ok(normalized) => normalized,
        Err(response) => return response,
    };

    if new_answer != confirm_answer {
        return fail(
            StatusCode::BAD_REQUEST,
            "New security answer and confirm security answer do not match",
        );
    }

    match password::verify_secret(&principal.user.security_answer, &new_answer) {
        Ok(false) => {}
        Ok(true) => {
            return fail(
                StatusCode::BAD_REQUEST,
                "New security answer must be different from the current security answer",
            )
        }
        Err(err) => {
            error!("Failed to compare new security answer: {err}");
            return server_error();
        }
    }

    let hash = match password::hash_secret(&new_answer) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash security answer: {err}");
            return server_error();
        }
    };
    match storage::update_security_answer(&pool, principal.user.id, &hash).await {
        Ok(()) => reply(StatusCode::OK, "Security answer reset successfully"),
        Err(err) => {
            error!("Failed to store security answer: {err}");
            server_error()
        }
    }
}

/// Shared tail of the password flows: strength rule, confirm match, no-change
/// check, then hash and store.
async fn change_password(
    pool: &PgPool,
    user: &UserRecord,
    new_password: &str,
    confirm_password: &str,
) -> Response {
    if let Err(reason) = rules::password(&FieldValue::Text(new_password.to_string())) {
        return fail(StatusCode::BAD_REQUEST, &format!("new_password: {reason}"));
    }

    if new_password != confirm_password {
        return fail(
            StatusCode::BAD_REQUEST,
            "New password and confirm password do not match",
        );
    }

    match password::verify_secret(&user.password_hash, new_password) {
        Ok(false) => {}
        Ok(true) => {
            return fail(
                StatusCode::BAD_REQUEST,
                "New password must be different from the current password",
            )
        }
        Err(err) => {
            error!("Failed to compare new password: {err}");
            return server_error();
        }
    }

    let hash = match password::hash_secret(new_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return server_error();
        }
    };
    match storage::update_password(pool, user.id, &hash).await {
        Ok(()) => reply(StatusCode::OK, "Password reset successfully"),
        Err(err) => {
            error!("Failed to store password: {err}");
            server_error()
        }
    }
}

/// Run a semantic rule on a replacement secret, returning the normalized
/// value or the ready-to-send 400.
fn checked_replacement(
    field: &str,
    rule: crate::validation::Semantic,
    value: &str,
) -> Result<String, Response> {
    match rule(&FieldValue::Text(value.to_string())) {
        Ok(Some(FieldValue::Text(normalized))) => Ok(normalized),
        Ok(_) => Ok(value.to_string()),
        Err(reason) => Err(fail(
            StatusCode::BAD_REQUEST,
            &format!("{field}: {reason}"),
        )),
    }
}
