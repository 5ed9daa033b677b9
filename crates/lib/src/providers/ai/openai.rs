use crate::{
    errors::AssistantError,
    providers::ai::{AiProvider, ChatMessage},
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

// --- OpenAI Provider implementation ---

/// A provider for the OpenAI chat completions API, or any server that speaks
/// the same protocol.
#[derive(Clone, Debug)]
pub struct OpenAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    /// Creates a new `OpenAiProvider`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        temperature: f32,
    ) -> Result<Self, AssistantError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(AssistantError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            temperature,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream: false,
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            "--> Sending chat completion request"
        );

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(AssistantError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::AiApi(error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(AssistantError::AiDeserialization)?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::AiApi("no choices returned".to_string()))?;
        let reply = choice.message.content.unwrap_or_default();

        debug!("<-- Chat completion reply: {reply}");
        Ok(reply)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
