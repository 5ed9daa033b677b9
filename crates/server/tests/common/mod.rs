//! # Common Test Utilities
//!
//! `TestApp` spawns a real server for one service on a random port, backed by
//! a temporary SQLite database and vector store, with the chat and embedding
//! APIs served by an `httpmock::MockServer`.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use httpmock::MockServer;
use leverage_server::{
    config::{self, Service},
    router,
    state::{build_app_state, AppState},
};
use reqwest::Client;
use serde_json::{json, Value};
use std::{fs::File, io::Write, net::SocketAddr};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const EMBEDDINGS_PATH: &str = "/v1/embeddings";

/// A chat-completions response body carrying `content`.
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    _data_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the server for `service` and returns a `TestApp` instance.
    pub async fn spawn(service: Service) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start_async().await;
        let data_dir = tempdir()?;
        let db_path = data_dir.path().join("test.db");
        let vectors_dir = data_dir.path().join("vectors");
        let config_path = data_dir.path().join("config.yml");

        let config_content = format!(
            r#"
port: 0
openai_api_key: "test-key"
openai_api_url: "{}"
model: "mock-chat-model"
temperature: 0.0
embedding_api_url: "{}"
embedding_model: "mock-embedding-model"
database_url: "sqlite:///{}"
vector_store_path: "{}"
retrieval_top_k: 5
min_confidence_score: 0.7
api_v1_prefix: "/api/v1"
"#,
            mock_server.url(CHAT_PATH),
            mock_server.url(EMBEDDINGS_PATH),
            db_path.display(),
            vectors_dir.display(),
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config_path = config_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non utf-8 temp path"))?;
        let config = config::get_config(Some(config_path))?;
        let app_state = build_app_state(config, service).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            app_state: app_state_for_harness,
            _data_dir: data_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url(path)).json(&body).send().await?)
    }

    /// Runs a `SELECT COUNT(*)` query against the server's database.
    pub async fn count(&self, sql: &str) -> Result<i64> {
        let conn = self.app_state.sqlite_provider.db.connect()?;
        let mut rows = conn.query(sql, ()).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| anyhow::anyhow!("count query returned no rows: {sql}"))?;
        Ok(row.get(0)?)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
