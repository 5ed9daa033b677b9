//! # Ownership Endpoint Tests
//!
//! Ingestion, direct resolution and retrieval resolution over HTTP. The chat
//! and embedding APIs are served by the mock server; every text embeds to the
//! same vector, so retrieval returns every stored document.

mod common;

use anyhow::Result;
use common::{completion, TestApp, CHAT_PATH, EMBEDDINGS_PATH};
use httpmock::Method;
use leverage_server::config::Service;
use serde_json::{json, Value};

const OWNERSHIP_KEY: &str = "Ownership Resolution Assistant";

fn product_matrix() -> Value {
    json!({
        "source": "product_matrix",
        "data": [
            {
                "feature_name": "Search",
                "description": "Site search and filters",
                "category": "Discovery",
                "owner_name": "Jane Doe",
                "owner_email": "jane@example.com",
                "team": "Product",
                "role": "PM"
            },
            {
                "feature_name": "Billing",
                "owner_name": "Raj Patel",
                "owner_email": "raj@example.com",
                "team": "Payments"
            }
        ]
    })
}

fn jane_answer() -> String {
    json!({
        "matches": [{
            "owner_name": "Jane Doe",
            "owner_email": "jane@example.com",
            "team": "Product",
            "role": "PM",
            "area_name": "Search",
            "rationale": "Jane owns Search.",
            "confidence_score": 0.9
        }]
    })
    .to_string()
}

fn mock_embeddings(app: &TestApp) {
    app.mock_server.mock(|when, then| {
        when.method(Method::POST).path(EMBEDDINGS_PATH);
        then.status(200)
            .json_body(json!({"data": [{"embedding": [0.1, 0.2, 0.3]}]}));
    });
}

#[tokio::test]
async fn test_root_and_health_report_version() -> Result<()> {
    let app = TestApp::spawn(Service::Ownership).await?;

    let root: Value = app.client.get(app.url("/")).send().await?.json().await?;
    assert_eq!(root["name"], "Ownership Resolution Assistant");
    assert_eq!(root["docs"], "/docs");

    let health: Value = app.client.get(app.url("/health")).send().await?.json().await?;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["version"], root["version"]);
    Ok(())
}

#[tokio::test]
async fn test_ingest_is_idempotent() -> Result<()> {
    let app = TestApp::spawn(Service::Ownership).await?;
    mock_embeddings(&app);

    let response = app.post("/api/v1/ingest", product_matrix()).await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({"status": "success", "source": "product_matrix", "records_ingested": 2})
    );

    // The unversioned route runs the same ingestion.
    let body: Value = app.post("/ingest", product_matrix()).await?.json().await?;
    assert_eq!(body["records_ingested"], 0);

    assert_eq!(app.count("SELECT COUNT(*) FROM owners").await?, 2);
    assert_eq!(app.count("SELECT COUNT(*) FROM ownerships").await?, 2);
    assert_eq!(app.count("SELECT COUNT(*) FROM knowledge_documents").await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_ingest_unsupported_source_is_400() -> Result<()> {
    let app = TestApp::spawn(Service::Ownership).await?;

    let response = app
        .post("/api/v1/ingest", json!({"source": "sharepoint", "data": []}))
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["detail"], "Unsupported source: sharepoint");

    let body: Value = app
        .post("/api/v1/ingest", json!({"source": "notion", "data": [{"page": "x"}]}))
        .await?
        .json()
        .await?;
    assert_eq!(body["records_ingested"], 0);
    Ok(())
}

#[tokio::test]
async fn test_ingest_embedding_failure_is_500() -> Result<()> {
    let app = TestApp::spawn(Service::Ownership).await?;
    app.mock_server.mock(|when, then| {
        when.method(Method::POST).path(EMBEDDINGS_PATH);
        then.status(500).body("embedding backend down");
    });

    let response = app.post("/api/v1/ingest", product_matrix()).await?;
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await?;
    assert!(body["detail"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Ingestion failed: "));
    assert_eq!(app.count("SELECT COUNT(*) FROM ownerships").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_direct_query_creates_ticket() -> Result<()> {
    let app = TestApp::spawn(Service::Ownership).await?;
    mock_embeddings(&app);
    app.post("/ingest", product_matrix()).await?;
    let model_mock = app.mock_server.mock(|when, then| {
        when.method(Method::POST)
            .path(CHAT_PATH)
            .body_contains(OWNERSHIP_KEY)
            .body_contains("Product Area: Billing");
        then.status(200).json_body(completion(&jane_answer()));
    });

    let response = app
        .post(
            "/query",
            json!({"query": "Who owns search?", "context": "Escalated by VIP"}),
        )
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    model_mock.assert();

    assert_eq!(body["query"], "Who owns search?");
    assert_eq!(body["best_match"]["owner_email"], "jane@example.com");
    assert_eq!(body["matches"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["needs_review"], false);
    assert!(body.get("retrieval_confidence").is_none());

    let ticket_id = body["ticket_id"].as_i64().expect("ticket id");
    assert_eq!(
        app.count(&format!(
            "SELECT COUNT(*) FROM ownership_messages WHERE ticket_id = {ticket_id}"
        ))
        .await?,
        2
    );
    assert_eq!(
        app.count("SELECT COUNT(*) FROM support_tickets WHERE resolved_owner_id IS NOT NULL")
            .await?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn test_retrieval_query_reports_confidence() -> Result<()> {
    let app = TestApp::spawn(Service::Ownership).await?;
    mock_embeddings(&app);
    app.post("/api/v1/ingest", product_matrix()).await?;
    app.mock_server.mock(|when, then| {
        when.method(Method::POST)
            .path(CHAT_PATH)
            .body_contains(OWNERSHIP_KEY);
        then.status(200).json_body(completion(&jane_answer()));
    });

    let response = app
        .post("/api/v1/ownership/query", json!({"query": "Who owns search?"}))
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;

    // Two documents against a top-k of five.
    assert_eq!(body["retrieval_confidence"], 0.4);
    assert!(body["supporting_context"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Product Area: "));
    assert_eq!(body["best_match"]["owner_name"], "Jane Doe");
    assert!(body["ticket_id"].is_i64());
    assert_eq!(
        app.count("SELECT COUNT(*) FROM query_history WHERE source = 'retrieval'")
            .await?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn test_query_model_failure_is_500_and_writes_nothing() -> Result<()> {
    let app = TestApp::spawn(Service::Ownership).await?;
    app.mock_server.mock(|when, then| {
        when.method(Method::POST).path(CHAT_PATH);
        then.status(200).json_body(completion("no idea"));
    });

    let response = app.post("/query", json!({"query": "Who owns search?"})).await?;
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await?;
    assert!(body["detail"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Model failed to produce JSON: "));
    assert_eq!(app.count("SELECT COUNT(*) FROM support_tickets").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_retrieval_embedding_outage_is_not_a_model_error() -> Result<()> {
    let app = TestApp::spawn(Service::Ownership).await?;
    app.mock_server.mock(|when, then| {
        when.method(Method::POST).path(EMBEDDINGS_PATH);
        then.status(503).body("embedding backend down");
    });
    let chat_mock = app.mock_server.mock(|when, then| {
        when.method(Method::POST).path(CHAT_PATH);
        then.status(200).json_body(completion(&jane_answer()));
    });

    let response = app
        .post("/api/v1/ownership/query", json!({"query": "Who owns search?"}))
        .await?;
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await?;
    let detail = body["detail"].as_str().unwrap_or_default();
    assert!(detail.starts_with("Vector store error: "), "{detail}");
    assert!(!detail.contains("Model failed to produce JSON"));

    chat_mock.assert_hits(0);
    assert_eq!(app.count("SELECT COUNT(*) FROM support_tickets").await?, 0);
    Ok(())
}
