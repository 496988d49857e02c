//! HTTP handlers, grouped by concern.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub mod chat;
pub mod knowledge;

/// `?session_id=` query shared by session-scoped endpoints.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

pub(crate) fn error_response(status: StatusCode, error: String) -> Response {
    (status, axum::Json(serde_json::json!({ "status": "error", "error": error }))).into_response()
}

/// 404 for read-only endpoints asked about a session nobody has opened.
pub(crate) fn unknown_session(id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("unknown session {}", id))
}
