use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{error, warn};

use crate::batch::BatchReport;
use crate::geocoding::ProviderId;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

/// Failures that reject the whole webhook call before any record is touched.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Missing Authorization header")]
    MissingCredential,
    #[error("Incorrect access token")]
    IncorrectCredential,
    #[error("No JSON data array found: {0}")]
    InvalidBody(String),
    #[error("Batch processing aborted: {0}")]
    Internal(String),
}

impl WebhookError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential | Self::IncorrectCredential => StatusCode::UNAUTHORIZED,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("Rejected webhook call: {}", self);
        }
        let body = ApiErrorBody {
            error: self.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

// ─── Request checks ──────────────────────────────────────────────

fn authorize(headers: &HeaderMap, access_token: &str) -> Result<(), WebhookError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(WebhookError::MissingCredential)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(WebhookError::IncorrectCredential)?;

    if bool::from(token.as_bytes().ct_eq(access_token.as_bytes())) {
        Ok(())
    } else {
        Err(WebhookError::IncorrectCredential)
    }
}

fn parse_batch(body: &[u8]) -> Result<Vec<Value>, WebhookError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(other) => Err(WebhookError::InvalidBody(format!(
            "expected an array, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(WebhookError::InvalidBody(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─── POST /webhook ───────────────────────────────────────────────

pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BatchReport>, WebhookError> {
    authorize(&headers, &state.access_token)?;
    let records = parse_batch(&body)?;

    // Backend and sink calls block; keep them off the async workers.
    let resolver = Arc::clone(&state.resolver);
    let report = tokio::task::spawn_blocking(move || resolver.process_batch(&records))
        .await
        .map_err(|e| WebhookError::Internal(e.to_string()))?;

    Ok(Json(report))
}

// ─── GET /health ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    backends: Vec<ProviderId>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backends: state.resolver.chain().provider_ids(),
    })
}
