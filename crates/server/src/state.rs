//! # Application State
//!
//! The shared `AppState` and the startup logic that builds it: the model
//! client, the optional Langfuse tracer, the SQLite database and, for the
//! ownership service, the vector store.

use crate::config::{AppConfig, Service};
use leverage::{
    ownership::ResolutionSettings,
    providers::{
        ai::{openai::OpenAiProvider, AiProvider},
        db::sqlite::SqliteProvider,
        trace::{LangfuseTracer, Tracer},
        vector::{EmbeddingSettings, SqliteVectorStore, VectorStore},
    },
};
use std::sync::Arc;
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Service,
    pub sqlite_provider: Arc<SqliteProvider>,
    pub ai_provider: Arc<dyn AiProvider>,
    pub tracer: Option<Arc<dyn Tracer>>,
    /// Only the ownership service opens a vector store.
    pub vector_store: Option<Arc<dyn VectorStore>>,
    pub resolution: ResolutionSettings,
}

impl AppState {
    pub fn tracer(&self) -> Option<&dyn Tracer> {
        self.tracer.as_deref()
    }
}

/// Builds the shared application state from the configuration.
pub async fn build_app_state(config: AppConfig, service: Service) -> anyhow::Result<AppState> {
    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is required"))?;
    let ai_provider: Arc<dyn AiProvider> = Arc::new(OpenAiProvider::new(
        config.openai_api_url.clone(),
        Some(api_key.clone()),
        config.model.clone(),
        config.temperature,
    )?);
    info!(model = %config.model, "Initialized chat model provider.");

    let tracer: Option<Arc<dyn Tracer>> = LangfuseTracer::from_keys(
        &config.langfuse_host,
        config.langfuse_public_key.as_deref(),
        config.langfuse_secret_key.as_deref(),
    )?
    .map(|t| Arc::new(t) as Arc<dyn Tracer>);
    if tracer.is_some() {
        info!(host = %config.langfuse_host, "Langfuse tracing enabled.");
    }

    let db_url = config.database_url_for(service);
    let sqlite_provider = SqliteProvider::new(&db_url).await?;
    info!(db_path = %db_url, "Initialized local storage provider (SQLite).");
    sqlite_provider.initialize_schema().await?;

    let vector_store: Option<Arc<dyn VectorStore>> = match service {
        Service::Ownership => {
            let store = SqliteVectorStore::open(
                &config.vector_store_dir(),
                EmbeddingSettings {
                    api_url: config.embedding_api_url.clone(),
                    model: config.embedding_model.clone(),
                    api_key: Some(api_key),
                },
            )
            .await?;
            Some(Arc::new(store))
        }
        Service::AntiTodo => None,
    };

    let resolution = ResolutionSettings {
        min_confidence_score: config.min_confidence_score,
        retrieval_top_k: config.retrieval_top_k,
    };

    Ok(AppState {
        config: Arc::new(config),
        service,
        sqlite_provider: Arc::new(sqlite_provider),
        ai_provider,
        tracer,
        vector_store,
        resolution,
    })
}
