//! # Ingestion Handler

use super::{AppError, AppState};
use crate::types::{IngestRequest, IngestResponse};
use axum::{extract::State, Json};
use leverage::{errors::AssistantError, ingest};
use tracing::info;

/// Ingests ownership records from a named source.
///
/// Unknown sources are a 400; every other failure is reported as
/// `Ingestion failed: ...`.
pub async fn ingest_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    info!(source = %payload.source, records = payload.data.len(), "Received ingestion request.");
    let vector_store = app_state
        .vector_store
        .as_deref()
        .ok_or_else(|| AppError::Internal("Vector store is not configured.".to_string()))?;

    let result = ingest::ingest(
        &app_state.sqlite_provider.db,
        vector_store,
        &payload.source,
        &payload.data,
    )
    .await
    .map_err(|e| match e {
        AssistantError::UnsupportedSource(_) => AppError::BadRequest(e.to_string()),
        other => AppError::Internal(format!("Ingestion failed: {other}")),
    })?;

    Ok(Json(IngestResponse {
        status: "success".to_string(),
        source: result.source,
        records_ingested: result.records_ingested,
    }))
}
