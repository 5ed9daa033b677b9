//! # Vector Store Providers
//!
//! The knowledge base behind retrieval-based ownership resolution. A store
//! embeds texts on insert and answers nearest-neighbour queries.

pub mod sqlite;

use crate::{errors::AssistantError, types::RetrievedDocument};
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde_json::Value;
use std::fmt::Debug;

pub use sqlite::{EmbeddingSettings, SqliteVectorStore};

#[async_trait]
pub trait VectorStore: Send + Sync + Debug + DynClone {
    /// Embeds and stores `texts`, returning one store id per text.
    ///
    /// `metadatas` is matched by position; missing entries are stored as `{}`.
    async fn add_texts(
        &self,
        texts: &[String],
        metadatas: &[Value],
    ) -> Result<Vec<String>, AssistantError>;

    /// Removes the documents with the given ids. Unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> Result<(), AssistantError>;

    /// Returns up to `k` documents, most similar first.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, AssistantError>;
}

dyn_clone::clone_trait_object!(VectorStore);
