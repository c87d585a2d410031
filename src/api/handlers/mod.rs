//! Route handlers and the shared response envelope.
//!
//! Every endpoint answers with the same JSON shape: `{"message": ...}` plus
//! optional extras on success, `{"error": ...}` on failure.

pub mod auth;
pub mod health;
pub mod pantry;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

pub(crate) fn reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Success envelope with extra top-level fields merged in.
pub(crate) fn reply_with(status: StatusCode, message: &str, extra: Value) -> Response {
    let mut body = json!({ "message": message });
    if let (Some(object), Value::Object(extra)) = (body.as_object_mut(), extra) {
        object.extend(extra);
    }
    (status, Json(body)).into_response()
}

pub(crate) fn fail(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

/// Generic answer for unexpected persistence or hashing failures; details
/// stay in the logs.
pub(crate) fn server_error() -> Response {
    fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[tokio::test]
    async fn reply_wraps_the_message() {
        let response = reply(StatusCode::OK, "done");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "message": "done" }));
    }

    #[tokio::test]
    async fn reply_with_merges_extras_at_the_top_level() {
        let response = reply_with(
            StatusCode::CREATED,
            "created",
            json!({ "user": { "username": "alice" } }),
        );
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "created", "user": { "username": "alice" } })
        );
    }

    #[tokio::test]
    async fn fail_uses_the_error_key() {
        let response = fail(StatusCode::BAD_REQUEST, "nope");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "nope" }));
    }
}
