use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use recsync_api::RecordError;

use super::AppState;

// ═══════════════════════════════════════════════════════════════
//  Request/response bodies
// ═══════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct NamePayload {
    #[serde(default)]
    name: Option<String>,
}

// ═══════════════════════════════════════════════════════════════
//  REST: /records
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_list(State(state): State<AppState>) -> Response {
    match state.service.list().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => error_response(e),
    }
}

pub(crate) async fn handle_create(
    State(state): State<AppState>,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> Response {
    let name = match extract_name(payload) {
        Ok(name) => name,
        Err(resp) => return resp,
    };
    match state.service.create(&name).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

// ═══════════════════════════════════════════════════════════════
//  REST: /records/{id}
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let name = match extract_name(payload) {
        Ok(name) => name,
        Err(resp) => return resp,
    };
    match state.service.update(id, &name).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => error_response(e),
    }
}

pub(crate) async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.service.delete(id).await {
        Ok(id) => Json(serde_json::json!({ "id": id })).into_response(),
        Err(e) => error_response(e),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Error mapping
// ═══════════════════════════════════════════════════════════════

/// Ids are parsed from a string path segment so a non-numeric id is a
/// 400 with the usual JSON error body, not a framework rejection.
fn parse_id(raw: &str) -> Result<i64, Response> {
    raw.parse::<i64>()
        .map_err(|_| error_response(RecordError::validation("Invalid record id")))
}

fn extract_name(payload: Result<Json<NamePayload>, JsonRejection>) -> Result<String, Response> {
    match payload {
        // A missing name field falls through to service validation.
        Ok(Json(payload)) => Ok(payload.name.unwrap_or_default()),
        Err(rejection) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "Invalid JSON body".into(),
                details: Some(rejection.body_text()),
            }),
        )
            .into_response()),
    }
}

fn error_response(err: RecordError) -> Response {
    let (status, body) = match err {
        RecordError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorBody { error: msg, details: None },
        ),
        RecordError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            ErrorBody { error: "Record not found".into(), details: None },
        ),
        RecordError::Store(detail) => {
            tracing::error!(error = %detail, "store operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { error: "Database error".into(), details: Some(detail) },
            )
        }
    };
    (status, Json(body)).into_response()
}
