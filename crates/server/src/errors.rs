use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leverage::AssistantError;
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// Every variant renders as `{"detail": message}`.
#[derive(Debug)]
pub enum AppError {
    /// An id in the request does not exist.
    NotFound(String),
    /// The request is well-formed JSON but cannot be served.
    BadRequest(String),
    /// The model call failed or its output was unusable.
    Upstream(String),
    /// Storage, vector store or misconfiguration.
    Internal(String),
}

impl AppError {
    /// Maps a library error, prefixing model failures with `model_prefix`.
    pub fn from_model_call(err: AssistantError, model_prefix: &str) -> Self {
        match err {
            AssistantError::NotFound(_) => AppError::NotFound(err.to_string()),
            AssistantError::UnsupportedSource(_) => AppError::BadRequest(err.to_string()),
            e if e.is_model_failure() => AppError::Upstream(format!("{model_prefix}: {e}")),
            e => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::NotFound(_) => AppError::NotFound(err.to_string()),
            AssistantError::UnsupportedSource(_) => AppError::BadRequest(err.to_string()),
            e if e.is_model_failure() => AppError::Upstream(e.to_string()),
            e => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, detail) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(msg) => {
                error!("Model error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Internal(msg) => {
                error!("Internal server error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status_code, Json(json!({ "detail": detail }))).into_response()
    }
}
