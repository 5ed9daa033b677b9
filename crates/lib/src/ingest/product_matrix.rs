use super::traits::{IngestionResult, Ingestor};
use crate::{
    errors::AssistantError,
    prompts::ownership::{kb_document_metadata, kb_document_text},
    providers::vector::VectorStore,
    store::{
        knowledge::{create_ownership_with_document, NewKnowledgeDocument},
        ownership::{find_ownership, get_or_create_area, get_or_create_owner},
    },
    types::ProductMatrixRecord,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use turso::Database;

const SOURCE: &str = "product_matrix";

/// Imports rows of a product feature matrix.
///
/// Owners are keyed by email, areas by name and mappings by the pair, so
/// ingesting the same rows twice creates nothing the second time. Only a new
/// mapping is embedded into the knowledge base.
pub struct ProductMatrixIngestor<'a> {
    db: &'a Database,
    vector_store: &'a dyn VectorStore,
}

impl<'a> ProductMatrixIngestor<'a> {
    pub fn new(db: &'a Database, vector_store: &'a dyn VectorStore) -> Self {
        Self { db, vector_store }
    }

    /// Returns the vector-store id when a new mapping was written.
    async fn ingest_record(
        &self,
        record: &ProductMatrixRecord,
        feature_name: &str,
        owner_name: &str,
        owner_email: &str,
    ) -> Result<Option<String>, AssistantError> {
        let owner = get_or_create_owner(
            self.db,
            owner_name,
            owner_email,
            record.team.as_deref(),
            record.role.as_deref(),
        )
        .await?;
        let area = get_or_create_area(
            self.db,
            feature_name,
            record.description.as_deref(),
            record.category.as_deref(),
        )
        .await?;

        if find_ownership(self.db, area.id, owner.id).await?.is_some() {
            return Ok(None);
        }

        // Embed first so a failed push leaves no mapping behind and a retry
        // picks the record up again.
        let content = kb_document_text(record);
        let metadata = kb_document_metadata(record);
        let ids = self
            .vector_store
            .add_texts(std::slice::from_ref(&content), std::slice::from_ref(&metadata))
            .await?;
        let embedding_id = ids.first().cloned();

        let written = create_ownership_with_document(
            self.db,
            area.id,
            owner.id,
            record.notes.as_deref(),
            NewKnowledgeDocument {
                content: &content,
                source: SOURCE,
                metadata: Some(&metadata),
                embedding_id: embedding_id.as_deref(),
            },
        )
        .await;

        if let Err(e) = written {
            // The mapping was rolled back; drop its vector too so a retry
            // does not leave a duplicate behind.
            if let Err(cleanup) = self.vector_store.delete(&ids).await {
                warn!("Failed to remove vector documents {ids:?} after a failed write: {cleanup}");
            }
            return Err(e);
        }

        Ok(Some(embedding_id.unwrap_or_default()))
    }
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl Ingestor for ProductMatrixIngestor<'_> {
    async fn ingest(&self, records: &[Value]) -> Result<IngestionResult, AssistantError> {
        let mut result = IngestionResult {
            source: SOURCE.to_string(),
            ..Default::default()
        };

        for (index, raw) in records.iter().enumerate() {
            let record: ProductMatrixRecord = match serde_json::from_value(raw.clone()) {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping product matrix record {index}: {e}");
                    result.records_skipped += 1;
                    continue;
                }
            };

            let (Some(feature), Some(name), Some(email)) = (
                required(&record.feature_name),
                required(&record.owner_name),
                required(&record.owner_email),
            ) else {
                warn!("Skipping product matrix record {index}: missing feature or owner");
                result.records_skipped += 1;
                continue;
            };

            if let Some(doc_id) = self.ingest_record(&record, feature, name, email).await? {
                result.records_ingested += 1;
                result.document_ids.push(doc_id);
            }
        }

        info!(
            "Product matrix ingestion finished: {} new mappings, {} skipped.",
            result.records_ingested, result.records_skipped
        );
        Ok(result)
    }
}
