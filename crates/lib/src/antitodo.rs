//! # Anti-To-Do Service
//!
//! Onboarding, recommendation generation and follow-up chat over a session
//! thread. Every model call goes through a chain so it can be traced.

use crate::{
    chain::{ChatChain, JsonChain},
    errors::AssistantError,
    prompts::antitodo::{build_recommendations_prompt, CHAT_SYSTEM_PROMPT},
    providers::{
        ai::{AiProvider, ChatMessage},
        trace::Tracer,
    },
    store::threads::{
        append_message, append_messages, create_thread_with_messages, get_thread,
        insert_recommendations, recent_messages, NewThread, SessionThread,
    },
    types::{Difficulty, RecommendationItem, SenderType},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use turso::Database;

/// Messages loaded as chat history, counted before role filtering.
pub const HISTORY_WINDOW: usize = 12;

/// At most this many items are kept from a flat `items` answer.
pub const LEGACY_ITEM_LIMIT: usize = 5;

pub const DEFAULT_CATEGORY: &str = "General";

const INITIALIZED_MESSAGE: &str = "Anti-To-Do assistant initialized.";

const ROLE_ALIASES: &[(&str, &str)] = &[
    ("pm", "Product Manager"),
    ("product boss", "Product Manager"),
    ("ops", "Operations Manager"),
    ("ops lead", "Operations Manager"),
    ("software dev", "Software Engineer"),
    ("swe", "Software Engineer"),
];

/// Maps a free-text role onto a canonical title.
///
/// Known aliases are matched after trimming and lowercasing; anything else is
/// title-cased word by word.
pub fn normalize_role(role: &str) -> String {
    let key = role.trim().to_lowercase();
    if let Some((_, canonical)) = ROLE_ALIASES.iter().find(|(alias, _)| *alias == key) {
        return canonical.to_string();
    }
    title_case(role.trim())
}

/// Uppercases the first letter of each alphabetic run, lowercases the rest.
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_alpha = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if previous_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(c);
            previous_alpha = false;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnboardOutcome {
    pub thread_id: i64,
    pub role_normalized: Option<String>,
    pub onet_code: Option<String>,
}

/// Creates a thread for a new user and seeds its conversation.
pub async fn onboard(
    db: &Database,
    role: &str,
    industry: &str,
    pains: &str,
) -> Result<OnboardOutcome, AssistantError> {
    let role_normalized = normalize_role(role);
    let intake = format!("Role={role}; Industry={industry}; Pains={pains}");
    let thread = create_thread_with_messages(
        db,
        NewThread {
            role_raw: role,
            industry_raw: industry,
            pains_raw: pains,
            role_normalized: Some(&role_normalized),
            onet_code: None,
        },
        &[
            (SenderType::System, INITIALIZED_MESSAGE),
            (SenderType::User, intake.as_str()),
        ],
    )
    .await?;

    info!(thread_id = thread.id, role = %role_normalized, "Onboarded new thread.");
    Ok(OnboardOutcome {
        thread_id: thread.id,
        role_normalized: thread.role_normalized,
        onet_code: thread.onet_code,
    })
}

async fn require_thread(db: &Database, thread_id: i64) -> Result<SessionThread, AssistantError> {
    get_thread(db, thread_id)
        .await?
        .ok_or_else(|| AssistantError::NotFound("Thread".to_string()))
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Minutes accept integers, truncated floats and numeric strings.
fn gain_minutes(value: Option<&Value>) -> Option<i64> {
    match value {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    }
}

fn difficulty(value: Option<&Value>) -> Option<Difficulty> {
    match value {
        None | Some(Value::Null) => Some(Difficulty::default()),
        Some(Value::String(s)) => s.parse().ok(),
        Some(_) => None,
    }
}

/// Validates one model item; `None` means the item is skipped.
fn parse_item(raw: &Value, category: String) -> Option<RecommendationItem> {
    let obj = raw.as_object()?;
    let item = obj.get("item")?.as_str()?.to_string();
    Some(RecommendationItem {
        item,
        rationale: text_field(obj.get("rationale")).unwrap_or_default(),
        category,
        estimated_gain_minutes: gain_minutes(obj.get("estimated_gain_minutes"))?,
        difficulty: difficulty(obj.get("difficulty"))?,
    })
}

fn items_of(obj: &Map<String, Value>) -> &[Value] {
    obj.get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Flattens either response shape into validated items.
///
/// A `categories` key wins over a flat `items` list. Invalid items are
/// dropped without failing the batch.
pub fn parse_recommendations(data: &Value) -> Result<Vec<RecommendationItem>, AssistantError> {
    let obj = data.as_object().ok_or_else(|| {
        AssistantError::OutputParse(format!("expected a JSON object, got: {data}"))
    })?;

    let mut items = Vec::new();
    let mut skipped = 0usize;

    if let Some(categories) = obj.get("categories") {
        for category in categories.as_array().map(Vec::as_slice).unwrap_or_default() {
            let Some(category) = category.as_object() else {
                continue;
            };
            let name = text_field(category.get("category_name"))
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            for raw in items_of(category) {
                match parse_item(raw, name.clone()) {
                    Some(item) => items.push(item),
                    None => skipped += 1,
                }
            }
        }
    } else {
        for raw in items_of(obj).iter().take(LEGACY_ITEM_LIMIT) {
            let category = raw
                .as_object()
                .and_then(|o| text_field(o.get("category")))
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            match parse_item(raw, category) {
                Some(item) => items.push(item),
                None => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        debug!("Skipped {skipped} invalid recommendation items.");
    }
    Ok(items)
}

/// Asks the model for recommendations and stores the valid ones.
pub async fn generate_recommendations(
    db: &Database,
    provider: &dyn AiProvider,
    tracer: Option<&dyn Tracer>,
    thread_id: i64,
) -> Result<Vec<RecommendationItem>, AssistantError> {
    let thread = require_thread(db, thread_id).await?;

    let blob = build_recommendations_prompt(
        &thread.role_raw,
        &thread.industry_raw,
        &thread.pains_raw,
        thread.role_normalized.as_deref(),
        thread.onet_code.as_deref(),
    );
    let data = JsonChain::new("recommendations", blob.system, provider, tracer)
        .invoke(&blob.user_payload())
        .await?;
    let items = parse_recommendations(&data)?;

    insert_recommendations(db, thread.id, &items).await?;
    append_message(
        db,
        thread.id,
        SenderType::Assistant,
        &serde_json::to_string(&data)?,
    )
    .await?;

    info!(thread_id, count = items.len(), "Generated recommendations.");
    Ok(items)
}

/// Answers a chat turn using the recent conversation as context.
///
/// Nothing is written unless the model answers.
pub async fn chat(
    db: &Database,
    provider: &dyn AiProvider,
    tracer: Option<&dyn Tracer>,
    thread_id: i64,
    message: &str,
) -> Result<String, AssistantError> {
    let thread = require_thread(db, thread_id).await?;

    let history: Vec<ChatMessage> = recent_messages(db, thread.id, HISTORY_WINDOW)
        .await?
        .into_iter()
        .filter_map(|m| match m.sender {
            SenderType::User => Some(ChatMessage::user(m.content)),
            SenderType::Assistant => Some(ChatMessage::assistant(m.content)),
            SenderType::System => None,
        })
        .collect();

    let reply = ChatChain::new("chat", CHAT_SYSTEM_PROMPT, provider, tracer)
        .invoke(&history, message)
        .await?;

    append_messages(
        db,
        thread.id,
        &[(SenderType::User, message), (SenderType::Assistant, reply.as_str())],
    )
    .await?;
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_role_aliases() {
        assert_eq!(normalize_role("pm"), "Product Manager");
        assert_eq!(normalize_role("  Product Boss "), "Product Manager");
        assert_eq!(normalize_role("OPS"), "Operations Manager");
        assert_eq!(normalize_role("ops lead"), "Operations Manager");
        assert_eq!(normalize_role("SWE"), "Software Engineer");
        assert_eq!(normalize_role("software dev"), "Software Engineer");
    }

    #[test]
    fn test_normalize_role_title_cases_unknown_roles() {
        assert_eq!(normalize_role("data scientist"), "Data Scientist");
        assert_eq!(normalize_role("VP of SALES"), "Vp Of Sales");
        assert_eq!(normalize_role("3d artist"), "3D Artist");
        assert_eq!(normalize_role("co-founder"), "Co-Founder");
    }

    #[test]
    fn test_parse_categorized_output() {
        let data = json!({
            "categories": [
                {
                    "category_name": "Meetings",
                    "items": [
                        {"item": "Agendas", "rationale": "Clear purpose", "estimated_gain_minutes": 30, "difficulty": "LOW"},
                        {"item": "Recaps", "estimated_gain_minutes": 12.9}
                    ]
                },
                {
                    "items": [
                        {"item": "Triage bugs", "estimated_gain_minutes": "45", "difficulty": "High"}
                    ]
                }
            ]
        });

        let items = parse_recommendations(&data).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].category, "Meetings");
        assert_eq!(items[0].difficulty, Difficulty::Low);
        assert_eq!(items[1].rationale, "");
        assert_eq!(items[1].estimated_gain_minutes, 12);
        assert_eq!(items[1].difficulty, Difficulty::Medium);
        assert_eq!(items[2].category, DEFAULT_CATEGORY);
        assert_eq!(items[2].estimated_gain_minutes, 45);
    }

    #[test]
    fn test_parse_skips_invalid_items() {
        let data = json!({
            "categories": [{
                "category_name": "Docs",
                "items": [
                    {"rationale": "no item"},
                    {"item": "Bad minutes", "estimated_gain_minutes": "lots"},
                    {"item": "Bad difficulty", "difficulty": "extreme"},
                    "not an object",
                    {"item": "Keep me"}
                ]
            }]
        });

        let items = parse_recommendations(&data).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item, "Keep me");
        assert_eq!(items[0].estimated_gain_minutes, 0);
    }

    #[test]
    fn test_parse_legacy_items_caps_at_five() {
        let raw: Vec<Value> = (0..8)
            .map(|i| json!({"item": format!("Item {i}"), "category": "automate"}))
            .collect();
        let data = json!({ "items": raw });

        let items = parse_recommendations(&data).unwrap();
        assert_eq!(items.len(), LEGACY_ITEM_LIMIT);
        assert_eq!(items[4].item, "Item 4");
        assert!(items.iter().all(|i| i.category == "automate"));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse_recommendations(&json!([1, 2, 3])).is_err());
        assert!(parse_recommendations(&json!({})).unwrap().is_empty());
    }
}
