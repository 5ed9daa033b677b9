use crate::errors::AssistantError;
use async_trait::async_trait;
use serde_json::Value;

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionResult {
    /// The source name the records came from.
    pub source: String,
    /// Newly created ownership mappings.
    pub records_ingested: usize,
    /// Records dropped for missing required fields.
    pub records_skipped: usize,
    /// Vector-store ids of the knowledge documents written.
    pub document_ids: Vec<String>,
}

/// The contract every ownership data source implements.
///
/// Records arrive as loose JSON objects; each ingestor decides which fields
/// it needs and skips the rest.
#[async_trait]
pub trait Ingestor: Send + Sync {
    async fn ingest(&self, records: &[Value]) -> Result<IngestionResult, AssistantError>;
}
