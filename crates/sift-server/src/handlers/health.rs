//! Liveness and database connectivity handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{AppError, AppState};

/// GET /health - Process is up
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// GET /db-check - Run a trivial query against the store
pub async fn db_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let ok = state.db.check()?;
    Ok(Json(json!({ "db": true, "result": { "ok": ok } })))
}
