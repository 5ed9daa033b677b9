use super::{handlers, state::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Creates the Anti-To-Do router.
pub fn create_antitodo_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/onboard", post(handlers::onboard_handler))
        .route("/recommendations", post(handlers::recommendations_handler))
        .route("/chat", post(handlers::chat_handler))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Creates the ownership router.
///
/// The unversioned `/query` and `/ingest` routes sit next to the versioned
/// ones under the configured prefix.
pub fn create_ownership_router(app_state: AppState) -> Router {
    let prefix = app_state.config.route_prefix();
    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/query", post(handlers::direct_query_handler))
        .route("/ingest", post(handlers::ingest_handler))
        .route(
            &format!("{prefix}/ownership/query"),
            post(handlers::retrieval_query_handler),
        );
    // An empty prefix would register `/ingest` twice.
    if !prefix.is_empty() {
        router = router.route(&format!("{prefix}/ingest"), post(handlers::ingest_handler));
    }
    router
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Picks the router matching the service the state was built for.
pub fn create_router(app_state: AppState) -> Router {
    match app_state.service {
        crate::config::Service::AntiTodo => create_antitodo_router(app_state),
        crate::config::Service::Ownership => create_ownership_router(app_state),
    }
}
