//! # Ownership Resolution Service
//!
//! Answers "who owns X?" either from every known mapping (direct) or from
//! the documents nearest to the query in the vector store (retrieval).

use crate::{
    chain::JsonChain,
    errors::AssistantError,
    prompts::ownership::{build_ownership_resolution_prompt, build_retrieval_context},
    providers::{
        ai::AiProvider,
        trace::{self, GenerationTrace, Tracer},
        vector::VectorStore,
    },
    store::ownership::{
        append_ticket_messages, create_ticket, find_owner_by_email, list_ownership_records,
        record_query_history, resolve_ticket, QuerySource,
    },
    types::{OwnerMatch, SenderType},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use turso::Database;

/// Tunables shared by both resolution paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionSettings {
    /// A best match below this confidence is flagged for human review.
    pub min_confidence_score: f64,
    /// Documents fetched from the vector store per query.
    pub retrieval_top_k: usize,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            min_confidence_score: 0.7,
            retrieval_top_k: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub ticket_id: i64,
    pub query: String,
    pub matches: Vec<OwnerMatch>,
    pub best_match: Option<OwnerMatch>,
    pub needs_review: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResolution {
    #[serde(flatten)]
    pub resolution: Resolution,
    pub retrieval_confidence: f64,
    pub supporting_context: Option<String>,
}

fn non_empty_str(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn optional_str(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Keeps well-formed matches in model order, clamping confidence to `[0, 1]`.
pub fn parse_matches(data: &Value) -> Result<Vec<OwnerMatch>, AssistantError> {
    let obj = data.as_object().ok_or_else(|| {
        AssistantError::OutputParse(format!("expected a JSON object, got: {data}"))
    })?;
    let raw_matches = obj
        .get("matches")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut matches = Vec::with_capacity(raw_matches.len());
    for raw in raw_matches {
        let parsed = raw.as_object().and_then(|m| {
            Some(OwnerMatch {
                owner_name: non_empty_str(m, "owner_name")?,
                owner_email: non_empty_str(m, "owner_email")?,
                team: optional_str(m, "team"),
                role: optional_str(m, "role"),
                area_name: optional_str(m, "area_name"),
                rationale: m.get("rationale")?.as_str()?.to_string(),
                confidence_score: m.get("confidence_score")?.as_f64()?.clamp(0.0, 1.0),
            })
        });
        match parsed {
            Some(m) => matches.push(m),
            None => debug!("Skipping malformed ownership match: {raw}"),
        }
    }
    Ok(matches)
}

/// `min(docs / top_k, 1)` rounded to two decimals; zero without documents.
pub fn retrieval_confidence(doc_count: usize, top_k: usize) -> f64 {
    if doc_count == 0 || top_k == 0 {
        return 0.0;
    }
    let ratio = (doc_count as f64 / top_k as f64).min(1.0);
    (ratio * 100.0).round() / 100.0
}

/// A model answer ready to be written down.
struct Answered<'a> {
    query: &'a str,
    context: Option<&'a str>,
    data: &'a Value,
    matches: Vec<OwnerMatch>,
    supporting_context: Option<&'a str>,
    source: QuerySource,
}

/// Persists a completed resolution: ticket, best match, messages, history.
async fn record_resolution(
    db: &Database,
    settings: &ResolutionSettings,
    answered: Answered<'_>,
) -> Result<Resolution, AssistantError> {
    let Answered {
        query,
        context,
        data,
        matches,
        supporting_context,
        source,
    } = answered;
    let ticket_id = create_ticket(db, query, context).await?;
    let best_match = matches.first().cloned();

    let mut resolved_owner_id = None;
    let mut confidence = 0.0;
    if let Some(best) = &best_match {
        resolved_owner_id = find_owner_by_email(db, &best.owner_email)
            .await?
            .map(|o| o.id);
        confidence = best.confidence_score;
        resolve_ticket(
            db,
            ticket_id,
            resolved_owner_id,
            confidence,
            supporting_context.or(Some(best.rationale.as_str())),
        )
        .await?;
    }

    let raw = serde_json::to_string_pretty(data)?;
    append_ticket_messages(
        db,
        ticket_id,
        &[(SenderType::User, query), (SenderType::Assistant, &raw)],
    )
    .await?;
    record_query_history(db, query, resolved_owner_id, confidence, source).await?;

    let needs_review = best_match
        .as_ref()
        .map_or(true, |b| b.confidence_score < settings.min_confidence_score);

    info!(
        ticket_id,
        %source,
        matches = matches.len(),
        needs_review,
        "Resolved ownership query."
    );
    Ok(Resolution {
        ticket_id,
        query: query.to_string(),
        matches,
        best_match,
        needs_review,
    })
}

/// Resolves a query against every stored ownership mapping.
///
/// The model is called before anything is written.
pub async fn resolve_direct(
    db: &Database,
    provider: &dyn AiProvider,
    tracer: Option<&dyn Tracer>,
    settings: &ResolutionSettings,
    query: &str,
    context: Option<&str>,
) -> Result<Resolution, AssistantError> {
    let records = list_ownership_records(db).await?;
    debug!(records = records.len(), "Loaded ownership context.");

    let blob = build_ownership_resolution_prompt(query, context, &records);
    let data = JsonChain::new("ownership_resolution", blob.system, provider, tracer)
        .invoke(&blob.user_payload())
        .await?;
    let matches = parse_matches(&data)?;

    record_resolution(
        db,
        settings,
        Answered {
            query,
            context,
            data: &data,
            matches,
            supporting_context: None,
            source: QuerySource::Direct,
        },
    )
    .await
}

/// Resolves a query from the documents nearest to it in the knowledge base.
pub async fn resolve_with_retrieval(
    db: &Database,
    provider: &dyn AiProvider,
    tracer: Option<&dyn Tracer>,
    vector_store: &dyn VectorStore,
    settings: &ResolutionSettings,
    query: &str,
    context: Option<&str>,
) -> Result<RetrievalResolution, AssistantError> {
    let docs = vector_store
        .similarity_search(query, settings.retrieval_top_k)
        .await?;
    let confidence = retrieval_confidence(docs.len(), settings.retrieval_top_k);
    let supporting_context = docs.first().map(|d| d.content.clone());

    let mut blob = build_ownership_resolution_prompt(query, None, &[]);
    blob.context = build_retrieval_context(&docs, context);

    let start_time = Utc::now();
    let data = JsonChain::new("ownership_resolution", blob.system, provider, tracer)
        .invoke(&blob.user_payload())
        .await?;
    let end_time = Utc::now();
    let matches = parse_matches(&data)?;

    trace::report(
        tracer,
        GenerationTrace {
            name: "ownership_query".to_string(),
            model: provider.model_name().to_string(),
            input: Value::String(query.to_string()),
            output: data.clone(),
            metadata: json!({
                "confidence": confidence,
                "context": context,
                "retrieved_documents": docs.len(),
            }),
            start_time,
            end_time,
        },
    )
    .await;

    let resolution = record_resolution(
        db,
        settings,
        Answered {
            query,
            context,
            data: &data,
            matches,
            supporting_context: supporting_context.as_deref(),
            source: QuerySource::Retrieval,
        },
    )
    .await?;

    Ok(RetrievalResolution {
        resolution,
        retrieval_confidence: confidence,
        supporting_context,
    })
}
