//! # Ownership Data Ingestion
//!
//! Loads ownership data from external sources into the relational store and
//! the vector knowledge base.

pub mod product_matrix;
pub mod traits;

pub use product_matrix::ProductMatrixIngestor;
pub use traits::{IngestionResult, Ingestor};

use crate::{errors::AssistantError, providers::vector::VectorStore};
use serde_json::Value;
use std::{fmt, str::FromStr};
use tracing::info;
use turso::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestSource {
    ProductMatrix,
    /// Accepted, not yet imported.
    Notion,
    /// Accepted, not yet imported.
    Confluence,
}

impl IngestSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestSource::ProductMatrix => "product_matrix",
            IngestSource::Notion => "notion",
            IngestSource::Confluence => "confluence",
        }
    }
}

impl fmt::Display for IngestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestSource {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product_matrix" => Ok(IngestSource::ProductMatrix),
            "notion" => Ok(IngestSource::Notion),
            "confluence" => Ok(IngestSource::Confluence),
            other => Err(AssistantError::UnsupportedSource(other.to_string())),
        }
    }
}

/// Parses `source` and runs the matching ingestor over `records`.
pub async fn ingest(
    db: &Database,
    vector_store: &dyn VectorStore,
    source: &str,
    records: &[Value],
) -> Result<IngestionResult, AssistantError> {
    let source: IngestSource = source.parse()?;
    info!(%source, records = records.len(), "Starting ingestion.");

    match source {
        IngestSource::ProductMatrix => {
            ProductMatrixIngestor::new(db, vector_store)
                .ingest(records)
                .await
        }
        IngestSource::Notion | IngestSource::Confluence => Ok(IngestionResult {
            source: source.to_string(),
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parsing() {
        assert_eq!(
            "product_matrix".parse::<IngestSource>().unwrap(),
            IngestSource::ProductMatrix
        );
        assert_eq!("notion".parse::<IngestSource>().unwrap(), IngestSource::Notion);
        let err = "sharepoint".parse::<IngestSource>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported source: sharepoint");
    }
}
