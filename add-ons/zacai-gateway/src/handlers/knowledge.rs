//! Knowledge export/import and per-category status.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use zacai_core::{resolve_session_id, session_span, KnowledgeDocument};

use super::{error_response, unknown_session, SessionQuery};
use crate::AppState;

/// GET /api/v1/export – the whole Knowledge Store as a portable document.
pub async fn export(State(state): State<AppState>, Query(q): Query<SessionQuery>) -> Response {
    let id = resolve_session_id(q.session_id.as_deref());
    let span = session_span(&id);
    async move {
        let Some(orchestrator) = state.sessions.get(Some(&id)).await else {
            return unknown_session(&id);
        };
        let doc = orchestrator.export().await;
        tracing::info!(target: "zacai::gateway", entries = doc.entry_count(), "Knowledge exported");
        axum::Json(doc).into_response()
    }
    .instrument(span)
    .await
}

/// POST /api/v1/import – merges a document (request body) with the store merge rule.
/// Importing into a session that does not exist yet opens it.
pub async fn import(State(state): State<AppState>, Query(q): Query<SessionQuery>, body: String) -> Response {
    let id = resolve_session_id(q.session_id.as_deref());
    let span = session_span(&id);
    async move {
        let doc = match KnowledgeDocument::from_json(&body) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(target: "zacai::gateway", error = %e, "Rejected knowledge document");
                return error_response(StatusCode::BAD_REQUEST, e.to_string());
            }
        };
        let orchestrator = state.sessions.get_or_open(Some(&id)).await;
        let report = orchestrator.import(doc).await;
        tracing::info!(
            target: "zacai::gateway",
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            "Knowledge imported"
        );
        axum::Json(serde_json::json!({
            "status": "ok",
            "inserted": report.inserted,
            "updated": report.updated,
            "unchanged": report.unchanged,
        }))
        .into_response()
    }
    .instrument(span)
    .await
}

/// GET /api/v1/kb-status – entry counts per category for one session.
pub async fn kb_status(State(state): State<AppState>, Query(q): Query<SessionQuery>) -> Response {
    let id = resolve_session_id(q.session_id.as_deref());
    let Some(orchestrator) = state.sessions.get(Some(&id)).await else {
        return unknown_session(&id);
    };
    let categories = orchestrator.status().await;
    let total_entries: usize = categories.iter().map(|s| s.entry_count).sum();
    axum::Json(serde_json::json!({
        "status": "ok",
        "total_entries": total_entries,
        "categories": categories,
    }))
    .into_response()
}
