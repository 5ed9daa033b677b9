//! # Trace Providers
//!
//! Optional observability for model calls. A `Tracer` receives one
//! `GenerationTrace` per completed call; delivery problems are logged and
//! swallowed so tracing can never fail a request.

pub mod langfuse;

use crate::errors::AssistantError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dyn_clone::DynClone;
use serde_json::Value;
use std::fmt::Debug;
use tracing::warn;

pub use langfuse::LangfuseTracer;

/// A completed model call, as reported to the trace service.
#[derive(Debug, Clone)]
pub struct GenerationTrace {
    /// Logical name of the call, e.g. `recommendations` or `ownership_query`.
    pub name: String,
    pub model: String,
    pub input: Value,
    pub output: Value,
    pub metadata: Value,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[async_trait]
pub trait Tracer: Send + Sync + Debug + DynClone {
    async fn record_generation(&self, trace: GenerationTrace) -> Result<(), AssistantError>;
}

dyn_clone::clone_trait_object!(Tracer);

/// Sends a trace if a tracer is configured, logging any failure.
pub async fn report(tracer: Option<&dyn Tracer>, trace: GenerationTrace) {
    let Some(tracer) = tracer else {
        return;
    };
    let name = trace.name.clone();
    if let Err(e) = tracer.record_generation(trace).await {
        warn!("Trace delivery for '{name}' failed: {e}");
    }
}
