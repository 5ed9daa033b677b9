//! # General Route Handlers
//!
//! Root and health endpoints. Both services share the handlers; the body
//! depends on which service the state was built for.

use super::AppState;
use crate::config::Service;
use axum::{extract::State, Json};
use serde_json::{json, Value};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The handler for the root (`/`) endpoint.
pub async fn root(State(app_state): State<AppState>) -> Json<Value> {
    let service = app_state.service;
    match service {
        Service::AntiTodo => Json(json!({
            "name": service.name(),
            "version": VERSION,
        })),
        Service::Ownership => Json(json!({
            "name": service.name(),
            "version": VERSION,
            "docs": "/docs",
        })),
    }
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check(State(app_state): State<AppState>) -> Json<Value> {
    match app_state.service {
        Service::AntiTodo => Json(json!({ "status": "ok" })),
        Service::Ownership => Json(json!({ "status": "ok", "version": VERSION })),
    }
}
