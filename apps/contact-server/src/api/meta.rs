use axum::{response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct SampleUser {
    pub id: u32,
    pub name: &'static str,
    pub email: &'static str,
}

const SAMPLE_USERS: [SampleUser; 2] = [
    SampleUser {
        id: 1,
        name: "山田太郎",
        email: "yamada@example.com",
    },
    SampleUser {
        id: 2,
        name: "鈴木次郎",
        email: "suzuki@example.com",
    },
];

/// Liveness probe.
pub async fn healthz() -> impl IntoResponse {
    crate::responses::json_ok(json!({"ok": true}))
}

/// Fixed sample payload.
pub async fn hello() -> impl IntoResponse {
    Json(SAMPLE_USERS)
}
