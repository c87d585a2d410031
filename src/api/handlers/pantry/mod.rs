//! Pantry inventory endpoints.
//!
//! Every route resolves the caller through the session gate and operates on
//! the single pantry owned by that user; nothing here accepts a pantry or
//! user id from the request.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::auth::{principal::require_auth, AuthConfig};
use super::{fail, reply, reply_with, server_error};
use crate::validation::{rules, validate, FieldKind, FieldSpec};

pub mod storage;
pub mod types;

use storage::InsertOutcome;
use types::{within_window, ExpiringQuery, ItemResponse};

const ITEM_NOT_FOUND: &str = "Item doesn't exist in your pantry";
const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 7;

const NEW_ITEM_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("item", FieldKind::Text).check(rules::item_name),
    FieldSpec::required("used_by_date", FieldKind::Text).check(rules::expiry_date),
    FieldSpec::required("count", FieldKind::Count).check(rules::item_count),
];

const UPDATE_ITEM_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("count", FieldKind::Count).check(rules::item_count),
    FieldSpec::optional("used_by_date", FieldKind::Text).check(rules::expiry_date),
];

/// Resolve the caller and their pantry id in one step.
async fn caller_pantry(
    headers: &HeaderMap,
    pool: &PgPool,
    config: &AuthConfig,
) -> Result<i64, Response> {
    let principal = require_auth(headers, pool, config).await?;
    match storage::pantry_for_user(pool, principal.user.id).await {
        Ok(Some(pantry_id)) => Ok(pantry_id),
        // Registration provisions the pantry transactionally, so this is a
        // data fault, not a client error.
        Ok(None) => {
            error!("No pantry found for user {}", principal.user.id);
            Err(server_error())
        }
        Err(err) => {
            error!("Failed to resolve pantry: {err}");
            Err(server_error())
        }
    }
}

#[utoipa::path(
    get,
    path = "/pantry",
    responses(
        (status = 200, description = "All items in the caller's pantry", body = types::ItemListResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = super::auth::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "pantry"
)]
pub async fn get_pantry(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    let pantry_id = match caller_pantry(&headers, &pool, &config).await {
        Ok(pantry_id) => pantry_id,
        Err(response) => return response,
    };

    match storage::list_items(&pool, pantry_id).await {
        Ok(records) => {
            let message = if records.is_empty() {
                "Pantry is currently empty"
            } else {
                "Pantry retrieved successfully"
            };
            let items: Vec<ItemResponse> = records.into_iter().map(ItemResponse::from).collect();
            reply_with(StatusCode::OK, message, json!({ "items": items }))
        }
        Err(err) => {
            error!("Failed to list pantry items: {err}");
            server_error()
        }
    }
}

#[utoipa::path(
    get,
    path = "/pantry/expiring",
    params(
        ("days" = Option<i64>, Query, description = "Window size in days, defaults to 7")
    ),
    responses(
        (status = 200, description = "Items whose used-by date falls within the window", body = types::ItemListResponse),
        (status = 400, description = "Negative window", body = super::auth::types::ErrorResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = super::auth::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "pantry"
)]
pub async fn get_expiring(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    Query(query): Query<ExpiringQuery>,
) -> impl IntoResponse {
    let pantry_id = match caller_pantry(&headers, &pool, &config).await {
        Ok(pantry_id) => pantry_id,
        Err(response) => return response,
    };

    let days = query.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    if days < 0 {
        return fail(StatusCode::BAD_REQUEST, "days must be a non-negative integer");
    }

    match storage::list_items(&pool, pantry_id).await {
        Ok(records) => {
            let today = Utc::now().date_naive();
            let items: Vec<ItemResponse> = records
                .into_iter()
                .filter(|record| {
                    types::parse_used_by_date(&record.used_by_date)
                        .is_some_and(|date| within_window(date, today, days))
                })
                .map(ItemResponse::from)
                .collect();
            let message = format!("Items expiring within {days} days");
            reply_with(StatusCode::OK, &message, json!({ "items": items }))
        }
        Err(err) => {
            error!("Failed to list pantry items: {err}");
            server_error()
        }
    }
}

#[utoipa::path(
    get,
    path = "/pantry/{item}",
    params(
        ("item" = String, Path, description = "Item name, matched case-insensitively")
    ),
    responses(
        (status = 200, description = "The requested item", body = types::ItemResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = super::auth::types::ErrorResponse),
        (status = 404, description = "No such item in the caller's pantry", body = super::auth::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "pantry"
)]
pub async fn get_item(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    Path(item): Path<String>,
) -> impl IntoResponse {
    let pantry_id = match caller_pantry(&headers, &pool, &config).await {
        Ok(pantry_id) => pantry_id,
        Err(response) => return response,
    };
    let item = item.to_lowercase();

    match storage::find_item(&pool, pantry_id, &item).await {
        Ok(Some(record)) => reply_with(
            StatusCode::OK,
            "Item retrieved successfully",
            json!({ "item": ItemResponse::from(record) }),
        ),
        Ok(None) => fail(StatusCode::NOT_FOUND, ITEM_NOT_FOUND),
        Err(err) => {
            error!("Failed to lookup pantry item: {err}");
            server_error()
        }
    }
}

#[utoipa::path(
    post,
    path = "/pantry/item",
    request_body = types::NewItemRequest,
    responses(
        (status = 201, description = "Item added", body = super::auth::types::MessageResponse),
        (status = 400, description = "Validation failure or duplicate item", body = super::auth::types::ErrorResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = super::auth::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "pantry"
)]
pub async fn post_item(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    body: String,
) -> impl IntoResponse {
    let pantry_id = match caller_pantry(&headers, &pool, &config).await {
        Ok(pantry_id) => pantry_id,
        Err(response) => return response,
    };
    let data = match validate(&body, NEW_ITEM_FIELDS) {
        Ok(data) => data,
        Err(failure) => return failure.into_response(),
    };
    let (Some(item), Some(used_by_date), Some(count)) = (
        data.text("item"),
        data.text("used_by_date"),
        data.count("count"),
    ) else {
        return server_error();
    };

    // An item that arrives already run out gets its timestamp immediately.
    let run_out_time = (count == 0).then(Utc::now);

    match storage::insert_item(&pool, pantry_id, item, used_by_date, count, run_out_time).await {
        Ok(InsertOutcome::Added) => reply(StatusCode::CREATED, "Item added to the pantry"),
        Ok(InsertOutcome::Duplicate) => fail(
            StatusCode::BAD_REQUEST,
            "Item already exists in the pantry. Item names are case-insensitive",
        ),
        Err(err) => {
            error!("Failed to insert pantry item: {err}");
            server_error()
        }
    }
}

#[utoipa::path(
    put,
    path = "/pantry/{item}",
    params(
        ("item" = String, Path, description = "Item name, matched case-insensitively")
    ),
    request_body = types::UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = super::auth::types::MessageResponse),
        (status = 400, description = "Validation failure or empty update", body = super::auth::types::ErrorResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = super::auth::types::ErrorResponse),
        (status = 404, description = "No such item in the caller's pantry", body = super::auth::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "pantry"
)]
pub async fn put_item(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    Path(item): Path<String>,
    body: String,
) -> impl IntoResponse {
    let pantry_id = match caller_pantry(&headers, &pool, &config).await {
        Ok(pantry_id) => pantry_id,
        Err(response) => return response,
    };
    // Partial update: the pipeline validates only the supplied subset.
    let data = match validate(&body, UPDATE_ITEM_FIELDS) {
        Ok(data) => data,
        Err(failure) => return failure.into_response(),
    };
    if data.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "No updates provided");
    }
    let item = item.to_lowercase();

    let existing = match storage::find_item(&pool, pantry_id, &item).await {
        Ok(Some(record)) => record,
        Ok(None) => return fail(StatusCode::NOT_FOUND, ITEM_NOT_FOUND),
        Err(err) => {
            error!("Failed to lookup pantry item: {err}");
            return server_error();
        }
    };

    let count = data.count("count").unwrap_or(existing.count);
    let used_by_date = data
        .text("used_by_date")
        .unwrap_or(&existing.used_by_date)
        .to_string();
    // Stamp the run-out time when the count hits zero, clear it when stock
    // comes back.
    let run_out_time = if count == 0 {
        existing.run_out_time.or_else(|| Some(Utc::now()))
    } else {
        None
    };

    match storage::update_item(&pool, pantry_id, &item, &used_by_date, count, run_out_time).await {
        Ok(true) => reply(StatusCode::OK, "Item updated successfully"),
        Ok(false) => fail(StatusCode::NOT_FOUND, ITEM_NOT_FOUND),
        Err(err) => {
            error!("Failed to update pantry item: {err}");
            server_error()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/pantry/{item}",
    params(
        ("item" = String, Path, description = "Item name, matched case-insensitively")
    ),
    responses(
        (status = 200, description = "Item removed", body = super::auth::types::MessageResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = super::auth::types::ErrorResponse),
        (status = 404, description = "No such item in the caller's pantry", body = super::auth::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "pantry"
)]
pub async fn delete_item(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    Path(item): Path<String>,
) -> impl IntoResponse {
    let pantry_id = match caller_pantry(&headers, &pool, &config).await {
        Ok(pantry_id) => pantry_id,
        Err(response) => return response,
    };
    let item = item.to_lowercase();

    match storage::delete_item(&pool, pantry_id, &item).await {
        Ok(true) => reply(StatusCode::OK, "Item removed from the pantry"),
        Ok(false) => fail(StatusCode::NOT_FOUND, ITEM_NOT_FOUND),
        Err(err) => {
            error!("Failed to delete pantry item: {err}");
            server_error()
        }
    }
}
