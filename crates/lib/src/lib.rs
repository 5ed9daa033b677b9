//! # Leverage
//!
//! Core library behind two assistant backends:
//!
//! * **Anti-To-Do**: onboards a knowledge worker, asks the model for tasks they
//!   should stop doing by hand and keeps a follow-up chat.
//! * **Ownership Resolution**: finds the owner of a product area, either from
//!   stored mappings or from a vector knowledge base built by ingestion.
//!
//! The crate owns the persistence layer, prompt builders, model chains and
//! the external adapters (chat model, embeddings, tracing, vector store).
//! HTTP concerns live in `leverage-server`.

pub mod antitodo;
pub mod chain;
pub mod errors;
pub mod ingest;
pub mod ownership;
pub mod prompts;
pub mod providers;
pub mod store;
pub mod types;

pub use errors::AssistantError;
pub use providers::{
    ai::{AiProvider, ChatMessage, ChatRole},
    db::sqlite::SqliteProvider,
    trace::Tracer,
    vector::VectorStore,
};
