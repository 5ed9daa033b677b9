use thiserror::Error;

/// Custom error types for the library.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("Invalid json output: {0}")]
    OutputParse(String),
    #[error("Storage connection error: {0}")]
    StorageConnection(String),
    #[error("Storage operation failed: {0}")]
    StorageOperationFailed(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),
    #[error("Vector store error: {0}")]
    VectorStore(String),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}

impl From<turso::Error> for AssistantError {
    fn from(err: turso::Error) -> Self {
        AssistantError::StorageOperationFailed(err.to_string())
    }
}

impl AssistantError {
    /// True when the model call itself failed or returned unusable output.
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            AssistantError::ReqwestClientBuild(_)
                | AssistantError::AiRequest(_)
                | AssistantError::AiDeserialization(_)
                | AssistantError::AiApi(_)
                | AssistantError::OutputParse(_)
        )
    }
}
