pub mod embedding;
pub mod openai;

use crate::errors::AssistantError;
use async_trait::async_trait;
use dyn_clone::DynClone;
pub use embedding::generate_embedding;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The role vocabulary understood by chat-completion models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message sent to a chat-completion model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A trait for interacting with a chat-completion model.
///
/// Implementations receive the full message list (system prompt, rolling
/// history and the new user turn) and return the model's reply text.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Sends a conversation to the model and returns the reply.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AssistantError>;

    /// The model name reported to the trace service.
    fn model_name(&self) -> &str;

    /// Generates a response from a single system and user prompt.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AssistantError> {
        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ];
        self.chat(&messages).await
    }
}

dyn_clone::clone_trait_object!(AiProvider);
