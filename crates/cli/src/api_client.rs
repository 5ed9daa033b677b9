//! # API Client
//!
//! A thin client for the two assistant services. Non-success responses are
//! turned into errors carrying the server's `detail` message.

use anyhow::{bail, Result};
use leverage::types::RecommendationItem;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Clone, Debug, Deserialize)]
pub struct OnboardResponse {
    pub thread_id: i64,
    pub role_normalized: Option<String>,
    #[allow(dead_code)]
    pub onet_code: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RecommendationsResponse {
    #[allow(dead_code)]
    pub thread_id: i64,
    pub items: Vec<RecommendationItem>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatResponse {
    #[allow(dead_code)]
    pub thread_id: i64,
    pub reply: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IngestResponse {
    #[allow(dead_code)]
    pub status: String,
    pub source: String,
    pub records_ingested: usize,
}

#[derive(Serialize)]
struct OnboardRequest<'a> {
    role: &'a str,
    industry: &'a str,
    pains: &'a str,
}

/// The client for making API calls to an assistant service.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn read<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&error_text)
                .ok()
                .and_then(|v| v["detail"].as_str().map(str::to_string))
                .unwrap_or(error_text);
            bail!("Failed to {action}. Server responded with {status}: {detail}");
        }
        Ok(response.json().await?)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value, action: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        info!("POST {url}");
        let response = self.client.post(&url).json(body).send().await?;
        Self::read(response, action).await
    }

    pub async fn health(&self) -> Result<Value> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::read(response, "check health").await
    }

    pub async fn onboard(&self, role: &str, industry: &str, pains: &str) -> Result<OnboardResponse> {
        let body = serde_json::to_value(OnboardRequest {
            role,
            industry,
            pains,
        })?;
        self.post("/onboard", &body, "create a session").await
    }

    pub async fn recommendations(&self, thread_id: i64) -> Result<RecommendationsResponse> {
        self.post(
            "/recommendations",
            &json!({ "thread_id": thread_id }),
            "get recommendations",
        )
        .await
    }

    pub async fn chat(&self, thread_id: i64, message: &str) -> Result<ChatResponse> {
        self.post(
            "/chat",
            &json!({ "thread_id": thread_id, "message": message }),
            "send the message",
        )
        .await
    }

    /// Queries ownership, through the knowledge base when `prefix` is given.
    pub async fn ownership_query(
        &self,
        query: &str,
        context: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<Value> {
        let path = match prefix {
            Some(prefix) => format!("{prefix}/ownership/query"),
            None => "/query".to_string(),
        };
        self.post(
            &path,
            &json!({ "query": query, "context": context }),
            "resolve ownership",
        )
        .await
    }

    pub async fn ingest(
        &self,
        source: &str,
        data: Vec<Value>,
        prefix: Option<&str>,
    ) -> Result<IngestResponse> {
        let path = format!("{}/ingest", prefix.unwrap_or_default());
        self.post(
            &path,
            &json!({ "source": source, "data": data }),
            "ingest data",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method, MockServer};

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(Method::POST).path("/chat");
            then.status(404).json_body(json!({"detail": "Thread not found"}));
        });

        let client = ApiClient::new(&server.base_url());
        let err = client.chat(7, "hi").await.unwrap_err();
        assert!(err.to_string().ends_with("404 Not Found: Thread not found"));
    }

    #[tokio::test]
    async fn test_versioned_ingest_path() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/api/v1/ingest")
                .json_body(json!({"source": "product_matrix", "data": [{"feature_name": "Search"}]}));
            then.status(200).json_body(
                json!({"status": "success", "source": "product_matrix", "records_ingested": 1}),
            );
        });

        let client = ApiClient::new(&format!("{}/", server.base_url()));
        let result = client
            .ingest(
                "product_matrix",
                vec![json!({"feature_name": "Search"})],
                Some("/api/v1"),
            )
            .await
            .unwrap();
        mock.assert();
        assert_eq!(result.records_ingested, 1);
    }
}
