use super::VectorStore;
use crate::{
    errors::AssistantError, providers::ai::generate_embedding, types::RetrievedDocument,
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use std::{
    fmt::{self, Debug},
    path::Path,
};
use tracing::{debug, info};
use turso::{params, Database, Value as TursoValue};
use uuid::Uuid;

/// Name of the database file created inside the persist directory.
pub const VECTOR_DB_FILE: &str = "vectors.db";

/// The collection every ingested ownership document is written to.
pub const DEFAULT_COLLECTION: &str = "ownership_knowledge";

const CREATE_VECTOR_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS vector_documents (
        id TEXT PRIMARY KEY,
        collection TEXT NOT NULL,
        content TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        embedding BLOB NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

/// Where and how texts are embedded.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// A vector store persisted in its own SQLite file.
///
/// Embeddings are stored as `vector32` blobs and ranked with
/// `vector_distance_cos`, mapped to a similarity in `[0, 1]`.
#[derive(Clone)]
pub struct SqliteVectorStore {
    db: Database,
    client: ReqwestClient,
    embedding: EmbeddingSettings,
    collection: String,
}

impl Debug for SqliteVectorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteVectorStore")
            .field("collection", &self.collection)
            .field("embedding_model", &self.embedding.model)
            .finish_non_exhaustive()
    }
}

fn vector_literal(vector: &[f32]) -> String {
    format!(
        "[{}]",
        vector
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

impl SqliteVectorStore {
    /// Opens (creating if needed) the store under `persist_dir`.
    pub async fn open(
        persist_dir: &str,
        embedding: EmbeddingSettings,
    ) -> Result<Self, AssistantError> {
        std::fs::create_dir_all(persist_dir).map_err(|e| {
            AssistantError::VectorStore(format!(
                "Failed to create persist directory '{persist_dir}': {e}"
            ))
        })?;
        let db_path = Path::new(persist_dir).join(VECTOR_DB_FILE);
        let db_path = db_path.to_str().ok_or_else(|| {
            AssistantError::VectorStore(format!("Invalid persist directory '{persist_dir}'"))
        })?;
        info!(path = %db_path, "Opening vector store.");
        Self::with_path(db_path, embedding).await
    }

    /// Opens the store at an explicit database path (`:memory:` for tests).
    pub async fn with_path(
        db_path: &str,
        embedding: EmbeddingSettings,
    ) -> Result<Self, AssistantError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| AssistantError::StorageConnection(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| AssistantError::StorageConnection(e.to_string()))?;
        conn.execute(CREATE_VECTOR_TABLE_SQL, ()).await?;

        let client = ReqwestClient::builder()
            .build()
            .map_err(AssistantError::ReqwestClientBuild)?;

        Ok(Self {
            db,
            client,
            embedding,
            collection: DEFAULT_COLLECTION.to_string(),
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AssistantError> {
        generate_embedding(
            &self.client,
            &self.embedding.api_url,
            &self.embedding.model,
            text,
            self.embedding.api_key.as_deref(),
        )
        .await
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add_texts(
        &self,
        texts: &[String],
        metadatas: &[Value],
    ) -> Result<Vec<String>, AssistantError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AssistantError::StorageConnection(e.to_string()))?;

        let mut ids = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let vector = self.embed(text).await?;
            let id = Uuid::new_v4().to_string();
            let metadata = metadatas
                .get(i)
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default()));

            conn.execute(
                "INSERT INTO vector_documents (id, collection, content, metadata, embedding) VALUES (?, ?, ?, ?, vector32(?))",
                params![
                    id.clone(),
                    self.collection.clone(),
                    text.clone(),
                    metadata.to_string(),
                    vector_literal(&vector)
                ],
            )
            .await?;
            ids.push(id);
        }

        debug!(count = ids.len(), "Stored texts in vector store.");
        Ok(ids)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), AssistantError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AssistantError::StorageConnection(e.to_string()))?;
        for id in ids {
            conn.execute(
                "DELETE FROM vector_documents WHERE id = ? AND collection = ?",
                params![id.clone(), self.collection.clone()],
            )
            .await?;
        }
        debug!(count = ids.len(), "Deleted texts from vector store.");
        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, AssistantError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_vector = self
            .embed(query)
            .await
            .map_err(|e| AssistantError::VectorStore(format!("query embedding failed: {e}")))?;
        let conn = self
            .db
            .connect()
            .map_err(|e| AssistantError::StorageConnection(e.to_string()))?;

        let sql = format!(
            "SELECT id, content, metadata, (1.0 - (vector_distance_cos(embedding, vector32(?)) / 2.0)) AS similarity
             FROM vector_documents
             WHERE collection = ?
             ORDER BY similarity DESC
             LIMIT {k}"
        );

        let mut rows = conn
            .query(
                &sql,
                params![vector_literal(&query_vector), self.collection.clone()],
            )
            .await?;

        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            let id = match row.get_value(0)? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            let content = match row.get_value(1)? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            let metadata = match row.get_value(2)? {
                TursoValue::Text(s) => serde_json::from_str(&s).unwrap_or(Value::Null),
                _ => Value::Null,
            };
            let score = match row.get_value(3)? {
                TursoValue::Real(f) => f,
                TursoValue::Integer(i) => i as f64,
                _ => 0.0,
            };
            documents.push(RetrievedDocument {
                id,
                content,
                metadata,
                score,
            });
        }

        info!(
            "Vector search returned {} of {k} requested documents.",
            documents.len()
        );
        Ok(documents)
    }
}
