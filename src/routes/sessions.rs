//! REST endpoints for session creation and inspection.
//!
//! - `POST /api/sessions/create` — create a session, return its id + snapshot
//! - `GET  /api/sessions/{id}`   — session snapshot or 404

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::AppState;

/// `POST /api/sessions/create` — allocate a fresh session.
///
/// The session starts with the default buffer and language, no participants,
/// no problem, and an empty chat log. Clients then join over the WebSocket.
pub async fn create_session(State(state): State<AppState>) -> Json<Value> {
    let session_id = state.sessions.create().await;
    // The snapshot read cannot fail for an id we just created.
    let session = state.sessions.get(&session_id).await.ok();
    Json(json!({
        "session_id": session_id,
        "session": session,
    }))
}

/// `GET /api/sessions/{id}` — snapshot of a session's current state.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.sessions.get(&id).await {
        Ok(session) => Ok(Json(json!({ "session": session }))),
        Err(e) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": e.to_string(), "code": "SESSION_NOT_FOUND"})),
        )),
    }
}
