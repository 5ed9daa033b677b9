//! Prompts for the Anti-To-Do recommender and its follow-up chat.

use serde::Serialize;
use serde_json::{json, Value};

pub const SYSTEM_PROMPT: &str = r#"You are Anti-To-Do, a pragmatic operations and productivity strategist for knowledge workers.
Your job: identify low-leverage tasks the user should STOP doing manually to reclaim time so they can focus on high-leverage tasks.

Principles:
- Prioritize leverage: eliminate, automate, batch, or delegate.
- Be role- and industry-aware. Avoid stereotypes. Avoid intimate/personal assumptions.
- Keep items concrete and verifiable in a workweek.
- Return only what's requested, in the specified JSON schema."#;

pub const RECOMMENDATIONS_INSTRUCTIONS: &str = r#"Using the user's details, produce 30-40 Anti-To-Do items organized by task categories tailored to the user's role and industry.
Produce 5-7 items per category across 6 categories. For each item, include a rationale tied to the user's role/industry/pains.
Keep item descriptions concise (2-5 words) like the examples shown.

Output JSON:
{
  "categories": [
    {
      "category_name": "Documents & Writing",
      "emoji": "📝",
      "items": [
        {
          "item": "Draft documents",
          "rationale": "Streamline initial content creation for PRDs, specs, or briefs.",
          "estimated_gain_minutes": 60,
          "difficulty": "low"
        }
      ]
    }
  ]
}"#;

pub const CHAT_SYSTEM_PROMPT: &str = "You are the Anti-To-Do assistant. Be concise and actionable; avoid stereotypes; clarify only if essential.";

/// Everything the recommendation chain needs, split the way it is sent.
#[derive(Debug, Clone, Serialize)]
pub struct PromptBlob {
    pub system: &'static str,
    pub instructions: &'static str,
    pub context: Value,
    pub few_shot: Value,
}

impl PromptBlob {
    /// The JSON user message sent after the system prompt.
    pub fn user_payload(&self) -> Value {
        json!({
            "instructions": self.instructions,
            "context": self.context,
            "few_shot": self.few_shot,
        })
    }
}

/// Builds the recommendation prompt from a thread's stored fields.
///
/// Missing normalized role or O*NET code are sent as empty strings so the
/// header always has the same shape.
pub fn build_recommendations_prompt(
    role_raw: &str,
    industry_raw: &str,
    pains_raw: &str,
    role_normalized: Option<&str>,
    onet_code: Option<&str>,
) -> PromptBlob {
    PromptBlob {
        system: SYSTEM_PROMPT,
        instructions: RECOMMENDATIONS_INSTRUCTIONS,
        context: json!({
            "role_input": role_raw,
            "industry_input": industry_raw,
            "pains_input": pains_raw,
            "role_normalized": role_normalized.unwrap_or_default(),
            "onet_code": onet_code.unwrap_or_default(),
        }),
        few_shot: few_shot_product_manager(),
    }
}

/// A worked example for a Product Manager in tech, used to anchor style.
pub fn few_shot_product_manager() -> Value {
    fn item(item: &str, rationale: &str, minutes: i64, difficulty: &str) -> Value {
        json!({
            "item": item,
            "rationale": rationale,
            "estimated_gain_minutes": minutes,
            "difficulty": difficulty,
        })
    }

    json!({
        "role_normalized": "Product Manager",
        "industry": "Tech",
        "pains": "Meetings; context switching; documentation overhead",
        "categories": [
            {
                "category_name": "Documents & Writing",
                "emoji": "📝",
                "items": [
                    item("Draft documents", "Streamline initial content creation for PRDs, specs, or briefs.", 60, "low"),
                    item("Get and give feedback", "Efficiently manage review cycles for documents and designs.", 45, "low"),
                    item("Create PRDs, specs, briefs", "Focus on clear and concise product definition documents.", 120, "medium"),
                    item("Summarize long Slack/email threads", "Quickly extract key decisions and action items from lengthy discussions.", 30, "low"),
                    item("TL;DRs for execs", "Provide concise summaries for executive stakeholders to save their time.", 20, "low"),
                ]
            },
            {
                "category_name": "Meetings & Agendas",
                "emoji": "📅",
                "items": [
                    item("Agendas, summaries, action items", "Ensure every meeting has a clear purpose and documented outcomes.", 30, "low"),
                    item("Follow-up/thank-you emails", "Automate or template post-meeting communications to maintain relationships.", 15, "low"),
                    item("Customer-call recaps to Slack", "Quickly share key insights from customer interactions with the team.", 20, "low"),
                    item("Discussion → Spec", "Efficiently translate meeting discussions into actionable specifications.", 60, "medium"),
                    item("Calendar review & optimization", "Regularly audit and refine calendar to reduce unnecessary meetings.", 45, "medium"),
                ]
            },
            {
                "category_name": "Research & Analysis",
                "emoji": "🔍",
                "items": [
                    item("Track competitors", "Stay informed about market trends and competitor moves without manual effort.", 60, "medium"),
                    item("Summarize NPS/survey results", "Quickly grasp customer sentiment from feedback data.", 90, "medium"),
                    item("Competitive pricing comparisons", "Automate data collection for pricing analysis to inform strategy.", 45, "medium"),
                    item("Market-trend tracking", "Monitor industry shifts and emerging opportunities efficiently.", 30, "low"),
                    item("Summarize A/B test results", "Rapidly interpret experiment outcomes to make data-driven decisions.", 60, "medium"),
                ]
            },
            {
                "category_name": "Storytelling & Communication",
                "emoji": "🎤",
                "items": [
                    item("Find customer stories", "Identify compelling user narratives for marketing and product validation.", 60, "medium"),
                    item("Make slides pretty", "Delegate or automate aesthetic improvements for presentations.", 90, "low"),
                    item("Explain product functionality", "Develop clear and concise explanations for new features.", 45, "medium"),
                    item("Draft investor updates", "Streamline the creation of regular communications for investors.", 120, "high"),
                    item("Create demo scripts", "Standardize product demonstrations for consistency and efficiency.", 90, "medium"),
                ]
            },
            {
                "category_name": "Hiring & People",
                "emoji": "👥",
                "items": [
                    item("Prep for interviews", "Streamline preparation for candidate interviews.", 30, "low"),
                    item("Summarize hiring-panel notes", "Quickly synthesize feedback from multiple interviewers.", 20, "low"),
                    item("Source hard-to-find candidates", "Leverage tools or networks to identify specialized talent.", 90, "high"),
                    item("Write job descriptions", "Create clear and compelling job descriptions efficiently.", 60, "medium"),
                    item("Create onboarding checklists", "Standardize the onboarding process for new hires.", 45, "low"),
                ]
            },
            {
                "category_name": "Building",
                "emoji": "🔧",
                "items": [
                    item("Triage bugs", "Efficiently prioritize and assign incoming bug reports.", 30, "low"),
                    item("Fix small UX issues", "Address minor user experience improvements in a focused manner.", 60, "medium"),
                    item("Keep docs up to date", "Ensure product documentation reflects current features and functionality.", 45, "medium"),
                    item("Release notes / changelog", "Generate release notes automatically from version control history.", 60, "medium"),
                    item("Code admin: tests, tracking, etc.", "Streamline administrative tasks related to code quality and monitoring.", 90, "high"),
                ]
            }
        ]
    })
}
