use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

pub fn json_ok(body: Value) -> axum::response::Response {
    (StatusCode::OK, Json(body)).into_response()
}

/// Problem-details style error body.
pub fn problem(status: StatusCode, title: &str, detail: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(json!({
            "type": "about:blank",
            "title": title,
            "status": status.as_u16(),
            "detail": detail.into(),
        })),
    )
        .into_response()
}

pub fn storage_unavailable(detail: impl Into<String>) -> axum::response::Response {
    problem(StatusCode::INTERNAL_SERVER_ERROR, "Storage Error", detail)
}
