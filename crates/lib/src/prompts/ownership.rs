//! Prompts for the Ownership Resolution Assistant.

use crate::types::{OwnershipRecord, ProductMatrixRecord, RetrievedDocument};
use serde::Serialize;
use serde_json::{json, Value};

pub const SYSTEM_PROMPT: &str = r#"You are an Ownership Resolution Assistant for Customer Support teams.
Your job: help identify the correct product owner or responsible team for product features and areas.

Principles:
- Be precise and factual based on the information provided
- Provide confidence scores based on evidence quality
- If unsure, indicate low confidence
- Always cite supporting context
- Return ownership information in the specified JSON format"#;

pub const OWNERSHIP_RESOLUTION_INSTRUCTIONS: &str = r#"Using the provided ownership information, identify the most relevant owner for the given query.

For EACH ownership match, include:
- owner_name: Name of the product owner
- owner_email: Email contact
- team: Team or department
- role: Role title (PM, Tech Lead, etc.)
- area_name: Product area/feature name
- rationale: Why this owner is relevant (based on query and context)
- confidence_score: Float between 0 and 1

Output JSON:
{
  "matches": [
    {
      "owner_name": "...",
      "owner_email": "...",
      "team": "...",
      "role": "...",
      "area_name": "...",
      "rationale": "...",
      "confidence_score": 0.85
    }
  ]
}"#;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Serialize)]
pub struct OwnershipPromptBlob {
    pub system: &'static str,
    pub instructions: &'static str,
    pub context: String,
    pub few_shot: Value,
    pub query: String,
}

impl OwnershipPromptBlob {
    pub fn user_payload(&self) -> Value {
        json!({
            "instructions": self.instructions,
            "query": self.query,
            "context": self.context,
            "example": self.few_shot,
        })
    }
}

pub fn few_shot_example() -> Value {
    json!({
        "query": "Who owns the search functionality?",
        "context": "Customer reporting slow search results",
        "matches": [
            {
                "owner_name": "Jane Doe",
                "owner_email": "jane@example.com",
                "team": "Product",
                "role": "PM",
                "area_name": "Search Functionality",
                "rationale": "Jane Doe is the PM for Search Functionality which handles search features and performance.",
                "confidence_score": 0.95
            }
        ]
    })
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

fn with_user_context(label: &str, context: Option<&str>, body: String) -> String {
    match context {
        Some(ctx) if !ctx.is_empty() => format!("{label}: {ctx}\n\n{body}"),
        _ => body,
    }
}

/// Builds the direct-resolution prompt from every known ownership mapping.
pub fn build_ownership_resolution_prompt(
    query: &str,
    context: Option<&str>,
    records: &[OwnershipRecord],
) -> OwnershipPromptBlob {
    let body = records
        .iter()
        .map(|r| {
            format!(
                "Product Area: {}\nDescription: {}\nCategory: {}\nOwner: {}\nEmail: {}\nTeam: {}\nRole: {}",
                r.area_name,
                or_na(r.description.as_deref()),
                or_na(r.category.as_deref()),
                r.owner_name,
                r.owner_email,
                or_na(r.team.as_deref()),
                or_na(r.role.as_deref()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    OwnershipPromptBlob {
        system: SYSTEM_PROMPT,
        instructions: OWNERSHIP_RESOLUTION_INSTRUCTIONS,
        context: with_user_context("User Context", context, body),
        few_shot: few_shot_example(),
        query: query.to_string(),
    }
}

/// Joins retrieved documents into the context of a retrieval query.
pub fn build_retrieval_context(docs: &[RetrievedDocument], context: Option<&str>) -> String {
    let body = docs
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    with_user_context("User context", context, body)
}

/// The knowledge-base text stored for one product matrix record.
pub fn kb_document_text(record: &ProductMatrixRecord) -> String {
    format!(
        "Product Area: {}\nDescription: {}\nCategory: {}\nOwner: {}\nTeam: {}\nRole: {}\nContact: {}\nNotes: {}",
        or_na(record.feature_name.as_deref()),
        or_na(record.description.as_deref()),
        or_na(record.category.as_deref()),
        or_na(record.owner_name.as_deref()),
        or_na(record.team.as_deref()),
        or_na(record.role.as_deref()),
        or_na(record.owner_email.as_deref()),
        or_na(record.notes.as_deref()),
    )
}

/// Metadata stored next to the knowledge-base text.
pub fn kb_document_metadata(record: &ProductMatrixRecord) -> Value {
    json!({
        "source": "product_matrix",
        "feature_name": record.feature_name,
        "category": record.category,
        "owner": record.owner_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(area: &str, team: Option<&str>) -> OwnershipRecord {
        OwnershipRecord {
            area_name: area.to_string(),
            description: None,
            category: Some("Core".to_string()),
            owner_name: "Jane Doe".to_string(),
            owner_email: "jane@example.com".to_string(),
            team: team.map(str::to_string),
            role: None,
        }
    }

    #[test]
    fn test_resolution_context_lists_records_with_placeholders() {
        let records = vec![record("Search", Some("Product")), record("Billing", None)];
        let blob = build_ownership_resolution_prompt("Who owns search?", None, &records);

        assert!(blob.context.starts_with("Product Area: Search\nDescription: N/A"));
        assert!(blob.context.contains("\n\nProduct Area: Billing"));
        assert!(blob.context.contains("Team: N/A"));
        assert_eq!(blob.query, "Who owns search?");
    }

    #[test]
    fn test_resolution_context_prefixes_user_context() {
        let blob = build_ownership_resolution_prompt(
            "Who owns search?",
            Some("Slow results"),
            &[record("Search", None)],
        );
        assert!(blob
            .context
            .starts_with("User Context: Slow results\n\nProduct Area: Search"));
        let payload = blob.user_payload();
        assert_eq!(payload["example"]["matches"][0]["owner_name"], "Jane Doe");
    }

    #[test]
    fn test_retrieval_context_joins_documents() {
        let docs = vec![
            RetrievedDocument {
                id: "a".into(),
                content: "first".into(),
                metadata: Value::Null,
                score: 0.9,
            },
            RetrievedDocument {
                id: "b".into(),
                content: "second".into(),
                metadata: Value::Null,
                score: 0.8,
            },
        ];
        assert_eq!(build_retrieval_context(&docs, None), "first\n\nsecond");
        assert_eq!(
            build_retrieval_context(&docs, Some("vip")),
            "User context: vip\n\nfirst\n\nsecond"
        );
    }

    #[test]
    fn test_kb_document_text() {
        let rec = ProductMatrixRecord {
            feature_name: Some("Search".into()),
            owner_name: Some("Jane Doe".into()),
            owner_email: Some("jane@example.com".into()),
            team: Some("Product".into()),
            ..Default::default()
        };
        let text = kb_document_text(&rec);
        assert!(text.starts_with("Product Area: Search\nDescription: N/A"));
        assert!(text.contains("Contact: jane@example.com"));
        assert!(text.ends_with("Notes: N/A"));
        assert_eq!(kb_document_metadata(&rec)["owner"], "Jane Doe");
    }
}
