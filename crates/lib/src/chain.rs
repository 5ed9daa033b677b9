//! # Model Chains
//!
//! Thin compositions of a fixed system prompt, a model and an output step.
//! `JsonChain` expects structured output; `ChatChain` returns free text.
//! Both report every completed call to the optional tracer.

use crate::{
    errors::AssistantError,
    providers::{
        ai::{AiProvider, ChatMessage},
        trace::{self, GenerationTrace, Tracer},
    },
};
use chrono::Utc;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

/// Extracts a JSON value from model output.
///
/// Accepts a bare JSON document or the first fenced markdown block.
pub fn parse_json_output(text: &str) -> Result<Value, AssistantError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let re = Regex::new(r"```(?:json|JSON)?\s*([\s\S]*?)\s*```")?;
    if let Some(block) = re.captures(trimmed).and_then(|c| c.get(1)) {
        return serde_json::from_str(block.as_str())
            .map_err(|e| AssistantError::OutputParse(format!("{e}: {}", block.as_str())));
    }

    Err(AssistantError::OutputParse(format!(
        "no JSON found in model output: {trimmed}"
    )))
}

/// System prompt plus a JSON user payload, parsed back into JSON.
#[derive(Debug, Clone, Copy)]
pub struct JsonChain<'a> {
    pub name: &'a str,
    pub system_prompt: &'a str,
    pub provider: &'a dyn AiProvider,
    pub tracer: Option<&'a dyn Tracer>,
}

impl<'a> JsonChain<'a> {
    pub fn new(
        name: &'a str,
        system_prompt: &'a str,
        provider: &'a dyn AiProvider,
        tracer: Option<&'a dyn Tracer>,
    ) -> Self {
        Self {
            name,
            system_prompt,
            provider,
            tracer,
        }
    }

    pub async fn invoke(&self, payload: &Value) -> Result<Value, AssistantError> {
        let user_prompt = serde_json::to_string_pretty(payload)?;
        debug!(chain = %self.name, user_prompt = %user_prompt, "--> Invoking JSON chain");

        let start_time = Utc::now();
        let raw = self
            .provider
            .generate(self.system_prompt, &user_prompt)
            .await?;
        let end_time = Utc::now();
        debug!(chain = %self.name, "<-- Raw model output: {raw}");

        trace::report(
            self.tracer,
            GenerationTrace {
                name: self.name.to_string(),
                model: self.provider.model_name().to_string(),
                input: payload.clone(),
                output: Value::String(raw.clone()),
                metadata: json!({
                    "latency_ms": (end_time - start_time).num_milliseconds()
                }),
                start_time,
                end_time,
            },
        )
        .await;

        parse_json_output(&raw)
    }
}

/// System prompt, rolling history and a new user turn, returning raw text.
#[derive(Debug, Clone, Copy)]
pub struct ChatChain<'a> {
    pub name: &'a str,
    pub system_prompt: &'a str,
    pub provider: &'a dyn AiProvider,
    pub tracer: Option<&'a dyn Tracer>,
}

impl<'a> ChatChain<'a> {
    pub fn new(
        name: &'a str,
        system_prompt: &'a str,
        provider: &'a dyn AiProvider,
        tracer: Option<&'a dyn Tracer>,
    ) -> Self {
        Self {
            name,
            system_prompt,
            provider,
            tracer,
        }
    }

    pub async fn invoke(
        &self,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<String, AssistantError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(user_message));
        debug!(chain = %self.name, turns = messages.len(), "--> Invoking chat chain");

        let start_time = Utc::now();
        let reply = self.provider.chat(&messages).await?;
        let end_time = Utc::now();

        trace::report(
            self.tracer,
            GenerationTrace {
                name: self.name.to_string(),
                model: self.provider.model_name().to_string(),
                input: serde_json::to_value(&messages)?,
                output: Value::String(reply.clone()),
                metadata: json!({
                    "history_turns": history.len(),
                    "latency_ms": (end_time - start_time).num_milliseconds()
                }),
                start_time,
                end_time,
            },
        )
        .await;

        Ok(reply)
    }
}
