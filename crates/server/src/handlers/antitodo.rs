//! # Anti-To-Do Handlers

use super::{AppError, AppState};
use crate::types::{
    ChatRequest, ChatResponse, OnboardRequest, OnboardResponse, RecommendationsRequest,
    RecommendationsResponse,
};
use axum::{extract::State, Json};
use leverage::antitodo;
use tracing::info;

/// Creates a thread from the intake form.
pub async fn onboard_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<OnboardRequest>,
) -> Result<Json<OnboardResponse>, AppError> {
    info!(role = %payload.role, "Received onboarding request.");
    let outcome = antitodo::onboard(
        &app_state.sqlite_provider.db,
        &payload.role,
        &payload.industry,
        &payload.pains,
    )
    .await?;

    Ok(Json(OnboardResponse {
        thread_id: outcome.thread_id,
        role_normalized: outcome.role_normalized,
        onet_code: outcome.onet_code,
    }))
}

pub async fn recommendations_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<RecommendationsRequest>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    info!(thread_id = payload.thread_id, "Received recommendations request.");
    let items = antitodo::generate_recommendations(
        &app_state.sqlite_provider.db,
        app_state.ai_provider.as_ref(),
        app_state.tracer(),
        payload.thread_id,
    )
    .await
    .map_err(|e| AppError::from_model_call(e, "Model failed to produce JSON"))?;

    Ok(Json(RecommendationsResponse {
        thread_id: payload.thread_id,
        items,
    }))
}

pub async fn chat_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    info!(thread_id = payload.thread_id, "Received chat message.");
    let reply = antitodo::chat(
        &app_state.sqlite_provider.db,
        app_state.ai_provider.as_ref(),
        app_state.tracer(),
        payload.thread_id,
        &payload.message,
    )
    .await
    .map_err(|e| AppError::from_model_call(e, "Chat model error"))?;

    Ok(Json(ChatResponse {
        thread_id: payload.thread_id,
        reply,
    }))
}
