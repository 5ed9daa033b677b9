//! # Providers
//!
//! Adapters for every external collaborator: the chat-completion model, the
//! embeddings API, the trace service, the vector store and the relational
//! database.

pub mod ai;
pub mod db;
pub mod trace;
pub mod vector;
