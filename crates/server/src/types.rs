use leverage::types::RecommendationItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Anti-To-Do payloads ---

#[derive(Debug, Deserialize)]
pub struct OnboardRequest {
    pub role: String,
    pub industry: String,
    pub pains: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnboardResponse {
    pub thread_id: i64,
    pub role_normalized: Option<String>,
    pub onet_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsRequest {
    pub thread_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub thread_id: i64,
    pub items: Vec<RecommendationItem>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub thread_id: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub thread_id: i64,
    pub reply: String,
}

// --- Ownership payloads ---

#[derive(Debug, Deserialize)]
pub struct OwnershipQueryRequest {
    pub query: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub source: String,
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: String,
    pub source: String,
    pub records_ingested: usize,
}
