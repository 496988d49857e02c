//! Chat, history and feedback handlers. Each request is resolved against the session's
//! orchestrator; an absent or blank `session_id` means the default session. Only `chat`
//! opens a new session; the others answer 404 for sessions that do not exist yet.

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use zacai_core::{resolve_session_id, session_span};

use super::{error_response, unknown_session, SessionQuery};
use crate::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub turn_id: String,
    pub helpful: bool,
}

/// POST /api/v1/chat – runs one query through the pipeline.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> axum::Json<serde_json::Value> {
    let id = resolve_session_id(req.session_id.as_deref());
    let span = session_span(&id);
    async move {
        let orchestrator = state.sessions.get_or_open(Some(&id)).await;
        tracing::info!(target: "zacai::chat", chars = req.prompt.len(), "Chat request received");

        let reply = orchestrator.submit(&req.prompt).await;
        let learned: serde_json::Map<String, serde_json::Value> = reply
            .learned
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        axum::Json(serde_json::json!({
            "status": "ok",
            "response": reply.text,
            "confidence": reply.confidence,
            "pathway": reply.pathway.name(),
            "thinking": reply.trace,
            "turn_id": reply.turn_id,
            "learned": learned,
        }))
    }
    .instrument(span)
    .await
}

/// GET /api/v1/history – the session's conversation log, oldest first.
pub async fn history(State(state): State<AppState>, Query(q): Query<SessionQuery>) -> Response {
    let id = resolve_session_id(q.session_id.as_deref());
    let Some(orchestrator) = state.sessions.get(Some(&id)).await else {
        return unknown_session(&id);
    };
    let turns = orchestrator.history().await;
    axum::Json(serde_json::json!({
        "status": "ok",
        "count": turns.len(),
        "turns": turns,
    }))
    .into_response()
}

/// POST /api/v1/feedback – marks an assistant turn helpful or unhelpful.
pub async fn feedback(State(state): State<AppState>, Json(req): Json<FeedbackRequest>) -> Response {
    let id = resolve_session_id(req.session_id.as_deref());
    let span = session_span(&id);
    async move {
        let Some(orchestrator) = state.sessions.get(Some(&id)).await else {
            return unknown_session(&id);
        };
        if orchestrator.feedback(&req.turn_id, req.helpful).await {
            tracing::info!(
                target: "zacai::chat",
                turn_id = %req.turn_id,
                helpful = req.helpful,
                "Feedback recorded"
            );
            axum::Json(serde_json::json!({ "status": "ok", "turn_id": req.turn_id })).into_response()
        } else {
            error_response(
                StatusCode::NOT_FOUND,
                format!("no assistant turn with id {}", req.turn_id),
            )
        }
    }
    .instrument(span)
    .await
}
