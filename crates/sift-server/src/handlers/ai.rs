//! Classification, validation and self-test handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::debug;

use crate::{AppError, AppState};
use sift_core::models::{BatchResponse, CategorizeRequest, SelfTestReport, ValidationResult};
use sift_core::run_self_test;

/// POST /ai/categorize - Classify a batch of transactions
///
/// Always answers 200 once the body parses; remote problems show up as
/// `mode` and `error` in the response.
pub async fn categorize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CategorizeRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request(&e.body_text()))?;
    debug!(count = request.transactions.len(), "Categorize request");

    let response = state.router.categorize_batch(&request.transactions).await;
    Ok(Json(response))
}

/// GET /ai/selftest - Validate the model, then run a tiny generation call
pub async fn selftest(State(state): State<Arc<AppState>>) -> Json<SelfTestReport> {
    Json(run_self_test(state.router.remote(), state.probe_timeout).await)
}

/// GET /ai/validate - Check the credential and model availability
pub async fn validate(State(state): State<Arc<AppState>>) -> Json<ValidationResult> {
    Json(state.router.remote().validate_model_availability().await)
}
