use super::{GenerationTrace, Tracer};
use crate::errors::AssistantError;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

// --- Langfuse ingestion API structures ---

#[derive(Serialize, Debug)]
struct IngestionBatch {
    batch: Vec<IngestionEvent>,
}

#[derive(Serialize, Debug)]
struct IngestionEvent {
    id: String,
    timestamp: String,
    #[serde(rename = "type")]
    kind: &'static str,
    body: Value,
}

/// Sends generation traces to a Langfuse instance.
#[derive(Clone)]
pub struct LangfuseTracer {
    client: ReqwestClient,
    host: String,
    public_key: String,
    secret_key: String,
}

impl fmt::Debug for LangfuseTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LangfuseTracer")
            .field("host", &self.host)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl LangfuseTracer {
    pub fn new(
        host: String,
        public_key: String,
        secret_key: String,
    ) -> Result<Self, AssistantError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(AssistantError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            public_key,
            secret_key,
        })
    }

    /// Builds a tracer only when both keys are present and non-empty.
    pub fn from_keys(
        host: &str,
        public_key: Option<&str>,
        secret_key: Option<&str>,
    ) -> Result<Option<Self>, AssistantError> {
        match (public_key, secret_key) {
            (Some(public), Some(secret)) if !public.is_empty() && !secret.is_empty() => Ok(Some(
                Self::new(host.to_string(), public.to_string(), secret.to_string())?,
            )),
            _ => Ok(None),
        }
    }

    fn ingestion_url(&self) -> String {
        format!("{}/api/public/ingestion", self.host)
    }
}

fn events_for(trace: &GenerationTrace) -> Vec<IngestionEvent> {
    let trace_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    vec![
        IngestionEvent {
            id: Uuid::new_v4().to_string(),
            timestamp: now.clone(),
            kind: "trace-create",
            body: json!({
                "id": trace_id,
                "name": trace.name,
                "input": trace.input,
                "output": trace.output,
                "metadata": trace.metadata,
            }),
        },
        IngestionEvent {
            id: Uuid::new_v4().to_string(),
            timestamp: now,
            kind: "generation-create",
            body: json!({
                "id": Uuid::new_v4().to_string(),
                "traceId": trace_id,
                "name": trace.name,
                "model": trace.model,
                "input": trace.input,
                "output": trace.output,
                "metadata": trace.metadata,
                "startTime": trace.start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
                "endTime": trace.end_time.to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
        },
    ]
}

#[async_trait]
impl Tracer for LangfuseTracer {
    async fn record_generation(&self, trace: GenerationTrace) -> Result<(), AssistantError> {
        let batch = IngestionBatch {
            batch: events_for(&trace),
        };
        debug!(name = %trace.name, "--> Sending trace batch to Langfuse");

        let response = self
            .client
            .post(self.ingestion_url())
            .basic_auth(&self.public_key, Some(&self.secret_key))
            .json(&batch)
            .send()
            .await
            .map_err(AssistantError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::AiApi(format!(
                "Langfuse ingestion rejected the batch: {error_text}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keys_requires_both_keys() {
        let host = "https://cloud.langfuse.com";
        assert!(LangfuseTracer::from_keys(host, None, None).unwrap().is_none());
        assert!(LangfuseTracer::from_keys(host, Some("pk"), None)
            .unwrap()
            .is_none());
        assert!(LangfuseTracer::from_keys(host, Some(""), Some("sk"))
            .unwrap()
            .is_none());
        let tracer = LangfuseTracer::from_keys(host, Some("pk"), Some("sk"))
            .unwrap()
            .expect("both keys should enable tracing");
        assert_eq!(
            tracer.ingestion_url(),
            "https://cloud.langfuse.com/api/public/ingestion"
        );
    }

    #[test]
    fn test_generation_event_links_to_trace() {
        let trace = GenerationTrace {
            name: "chat".to_string(),
            model: "gpt-4o-mini".to_string(),
            input: json!("hi"),
            output: json!("hello"),
            metadata: json!({}),
            start_time: Utc::now(),
            end_time: Utc::now(),
        };
        let events = events_for(&trace);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, "trace-create");
        assert_eq!(events[1].kind, "generation-create");
        assert_eq!(events[1].body["traceId"], events[0].body["id"]);
        assert_eq!(events[1].body["model"], "gpt-4o-mini");
    }
}
