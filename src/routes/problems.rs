//! REST endpoints for the read-only problem catalog.
//!
//! - `GET /api/problems`      — full catalog, optionally `?difficulty=easy`
//! - `GET /api/problems/{id}` — one problem or 404

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::problems::{all_problems, problem_by_id, problems_by_difficulty, Difficulty};

#[derive(Deserialize)]
pub struct ListQuery {
    pub difficulty: Option<Difficulty>,
}

/// `GET /api/problems` — list the catalog, filtered by tier when requested.
pub async fn list_problems(Query(query): Query<ListQuery>) -> Json<Value> {
    match query.difficulty {
        Some(difficulty) => Json(json!({ "problems": problems_by_difficulty(difficulty) })),
        None => Json(json!({ "problems": all_problems() })),
    }
}

/// `GET /api/problems/{id}` — one problem's full detail.
pub async fn get_problem(
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match problem_by_id(&id) {
        Some(problem) => Ok(Json(json!({ "problem": problem }))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("Problem {id} not found"), "code": "PROBLEM_NOT_FOUND"})),
        )),
    }
}
