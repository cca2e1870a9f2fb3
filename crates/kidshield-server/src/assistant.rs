//! Assistant endpoints: `GET /health`, `POST /ai/query`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use kidshield_ai::Assistant;
use kidshield_core::{Answer, QueryRequest};
use tracing::info;

use crate::{ApiError, health, parse_body};

/// Router for the assistant service.
pub fn assistant_router(assistant: Arc<Assistant>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ai/query", post(query))
        .with_state(assistant)
}

async fn query(
    State(assistant): State<Arc<Assistant>>,
    body: Bytes,
) -> Result<Json<Answer>, ApiError> {
    let value = parse_body(&body);
    let request =
        QueryRequest::from_json(value.as_ref()).map_err(|e| ApiError::bad_request(e.to_string()))?;

    info!(query = %request.query, "assistant query");
    let answer = assistant
        .answer(&request.query)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    info!(response_chars = answer.response.len(), "assistant answered");
    Ok(Json(answer))
}
