//! Code execution endpoint.
//!
//! - `POST /api/execute` — run the submitted code in the sandbox
//!
//! The response is always `200 OK` with an [`ExecutionResult`] body: runtime
//! failures, timeouts, and unsupported languages are outcomes of the run, not
//! transport errors.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::executor::{self, ExecutionResult};
use crate::problems::Language;
use crate::AppState;

/// Request body for `POST /api/execute`.
#[derive(Deserialize)]
pub struct ExecuteRequest {
    /// The program text to run (usually the session's current buffer).
    pub code: String,
    /// Language selector; only the JavaScript family has a backend.
    pub language: Language,
    /// Reserved for feeding test-case input to the program. Accepted and
    /// currently ignored, mirroring the original API.
    #[serde(default)]
    pub test_input: Option<String>,
}

/// `POST /api/execute` — run code under the sandbox's wall-clock bound.
///
/// Runs on its own handler task: concurrent execution requests never
/// serialize against each other or against the WebSocket event path.
pub async fn execute(
    State(state): State<AppState>,
    Json(payload): Json<ExecuteRequest>,
) -> Json<ExecutionResult> {
    let _ = payload.test_input;
    let result = executor::execute(&payload.code, payload.language, &state.config.execution).await;
    Json(result)
}
