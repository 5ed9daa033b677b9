//! # Ownership Resolution Handlers
//!
//! `/query` resolves against every stored mapping; the versioned
//! `/ownership/query` route resolves from the vector knowledge base.

use super::{AppError, AppState};
use crate::types::OwnershipQueryRequest;
use axum::{extract::State, Json};
use leverage::ownership::{self, Resolution, RetrievalResolution};
use tracing::info;

const MODEL_ERROR_PREFIX: &str = "Model failed to produce JSON";

pub async fn direct_query_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<OwnershipQueryRequest>,
) -> Result<Json<Resolution>, AppError> {
    info!(query = %payload.query, "Received direct ownership query.");
    let resolution = ownership::resolve_direct(
        &app_state.sqlite_provider.db,
        app_state.ai_provider.as_ref(),
        app_state.tracer(),
        &app_state.resolution,
        &payload.query,
        payload.context.as_deref(),
    )
    .await
    .map_err(|e| AppError::from_model_call(e, MODEL_ERROR_PREFIX))?;

    Ok(Json(resolution))
}

pub async fn retrieval_query_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<OwnershipQueryRequest>,
) -> Result<Json<RetrievalResolution>, AppError> {
    info!(query = %payload.query, "Received retrieval ownership query.");
    let vector_store = app_state
        .vector_store
        .as_deref()
        .ok_or_else(|| AppError::Internal("Vector store is not configured.".to_string()))?;

    let resolution = ownership::resolve_with_retrieval(
        &app_state.sqlite_provider.db,
        app_state.ai_provider.as_ref(),
        app_state.tracer(),
        vector_store,
        &app_state.resolution,
        &payload.query,
        payload.context.as_deref(),
    )
    .await
    .map_err(|e| AppError::from_model_call(e, MODEL_ERROR_PREFIX))?;

    Ok(Json(resolution))
}
