use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use contact_core::{
    ClientFieldErrors, RawContactForm, SubmissionResult, SubmitError, SubmitOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::{responses, AppState};

pub(crate) const MSG_SERVER_ERROR: &str =
    "送信に失敗しました。時間をおいて再度お試しください";

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

/// Form post from the contact page.
///
/// Success answers `303 See Other` to the completion page; validation
/// failures and duplicate emails answer `422` with the field errors.
pub async fn contacts_submit(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let input = RawContactForm::from_pairs(pairs);
    match state
        .submission()
        .submit(&SubmissionResult::initial(), &input)
        .await
    {
        Ok(SubmitOutcome::Redirect(path)) => Redirect::to(&path).into_response(),
        Ok(outcome) => {
            let result = outcome
                .into_result()
                .unwrap_or_else(|| SubmissionResult::server_failure(MSG_SERVER_ERROR));
            (StatusCode::UNPROCESSABLE_ENTITY, Json(result)).into_response()
        }
        Err(SubmitError::Store(err)) => {
            error!(target: "contacts", "contact submission failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubmissionResult::server_failure(MSG_SERVER_ERROR)),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateRequest {
    pub field: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub errors: ClientFieldErrors,
}

#[derive(Debug, Serialize)]
pub(crate) struct ValidateResponse {
    pub field: String,
    /// `None` when the blur was skipped and `errors` is unchanged.
    pub message: Option<String>,
    pub errors: ClientFieldErrors,
}

/// Blur-time validation of one field against the caller's current errors.
pub async fn contacts_validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    let ValidateRequest {
        field,
        value,
        mut errors,
    } = req;
    let message = errors
        .on_field_blur(state.schema(), &field, &value)
        .map(str::to_owned);
    Json(ValidateResponse {
        field,
        message,
        errors,
    })
}

pub async fn contacts_complete() -> impl IntoResponse {
    responses::json_ok(json!({"status": "complete"}))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    pub limit: Option<usize>,
}

pub async fn contacts_list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Response {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    match state.listing().recent(limit).await {
        Ok(items) => Json(items).into_response(),
        Err(err) => {
            error!(target: "contacts", "contact listing failed: {err:#}");
            responses::storage_unavailable("contact listing failed")
        }
    }
}
