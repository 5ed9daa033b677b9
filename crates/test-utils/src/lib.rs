use anyhow::Result;
use async_trait::async_trait;
use leverage::{
    errors::AssistantError,
    providers::{
        ai::{AiProvider, ChatMessage, ChatRole},
        db::sqlite::SqliteProvider,
        trace::{GenerationTrace, Tracer},
        vector::VectorStore,
    },
    types::RetrievedDocument,
};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use turso::Database;

// --- Test Setup ---

/// A fresh in-memory database with the full schema.
pub struct TestSetup {
    pub provider: SqliteProvider,
    pub db: Database,
}

impl TestSetup {
    pub async fn new() -> Result<Self> {
        let provider = SqliteProvider::new(":memory:").await?;
        provider.initialize_schema().await?;
        let db = provider.db.clone();
        Ok(Self { provider, db })
    }

    /// Runs a statement that returns no rows.
    pub async fn execute(&self, sql: &str) -> Result<()> {
        self.db.connect()?.execute(sql, ()).await?;
        Ok(())
    }

    /// Runs a `SELECT COUNT(*)`-style query and returns the single integer.
    pub async fn count(&self, sql: &str) -> Result<i64> {
        let conn = self.db.connect()?;
        let mut rows = conn.query(sql, ()).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| anyhow::anyhow!("count query returned no rows: {sql}"))?;
        Ok(row.get(0)?)
    }
}

// --- Mock AI Provider ---

/// A scripted chat model.
///
/// Responses are keyed by a substring of the system prompt and checked in the
/// order they were added. Every call is recorded for assertions.
#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    responses: Arc<Mutex<Vec<(String, Result<String, String>)>>>,
    calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-programs a response for system prompts containing `key`.
    pub fn add_response(&self, key: &str, response: &str) {
        self.responses
            .lock()
            .unwrap()
            .push((key.to_string(), Ok(response.to_string())));
    }

    /// Makes calls whose system prompt contains `key` fail with an API error.
    pub fn add_error(&self, key: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push((key.to_string(), Err(message.to_string())));
    }

    /// Every call as `(system prompt, last user message)`.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|messages| {
                let pick = |role: ChatRole| {
                    messages
                        .iter()
                        .rev()
                        .find(|m| m.role == role)
                        .map(|m| m.content.clone())
                        .unwrap_or_default()
                };
                (pick(ChatRole::System), pick(ChatRole::User))
            })
            .collect()
    }

    /// The full message lists sent to the model.
    pub fn get_messages(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        self.calls.lock().unwrap().push(messages.to_vec());

        let system_prompt = messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let responses = self.responses.lock().unwrap();
        for (key, response) in responses.iter() {
            if system_prompt.contains(key) {
                return response.clone().map_err(AssistantError::AiApi);
            }
        }

        Err(AssistantError::AiApi(format!(
            "MockAiProvider: No response programmed for system prompt. Got: '{system_prompt}'"
        )))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

// --- Mock Vector Store ---

/// An in-memory vector store ranking by shared words with the query.
#[derive(Clone, Debug, Default)]
pub struct MockVectorStore {
    documents: Arc<Mutex<Vec<RetrievedDocument>>>,
    next_id: Arc<AtomicUsize>,
    fail_writes: bool,
}

impl MockVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `add_texts` always fails.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn documents(&self) -> Vec<RetrievedDocument> {
        self.documents.lock().unwrap().clone()
    }
}

fn overlap(query: &str, content: &str) -> f64 {
    let content = content.to_lowercase();
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|word| content.contains(word))
        .count() as f64
}

#[async_trait]
impl VectorStore for MockVectorStore {
    async fn add_texts(
        &self,
        texts: &[String],
        metadatas: &[Value],
    ) -> Result<Vec<String>, AssistantError> {
        if self.fail_writes {
            return Err(AssistantError::VectorStore(
                "MockVectorStore: writes disabled".to_string(),
            ));
        }
        let mut documents = self.documents.lock().unwrap();
        let mut ids = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            documents.push(RetrievedDocument {
                id: id.clone(),
                content: text.clone(),
                metadata: metadatas.get(i).cloned().unwrap_or(Value::Null),
                score: 0.0,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), AssistantError> {
        self.documents
            .lock()
            .unwrap()
            .retain(|d| !ids.contains(&d.id));
        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, AssistantError> {
        let mut ranked: Vec<RetrievedDocument> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .map(|d| RetrievedDocument {
                score: overlap(query, &d.content),
                ..d.clone()
            })
            .collect();
        // Stable sort keeps insertion order among equal scores.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(k);
        Ok(ranked)
    }
}

// --- Recording Tracer ---

#[derive(Clone, Debug, Default)]
pub struct RecordingTracer {
    traces: Arc<Mutex<Vec<GenerationTrace>>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traces(&self) -> Vec<GenerationTrace> {
        self.traces.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.traces().into_iter().map(|t| t.name).collect()
    }
}

#[async_trait]
impl Tracer for RecordingTracer {
    async fn record_generation(&self, trace: GenerationTrace) -> Result<(), AssistantError> {
        self.traces.lock().unwrap().push(trace);
        Ok(())
    }
}
