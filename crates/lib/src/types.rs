//! # Shared Domain Types
//!
//! Plain data types shared by the persistence layer, the service logic and the
//! HTTP layer. Anything that crosses a crate boundary lives here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who produced a stored conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    User,
    Assistant,
    System,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::User => "user",
            SenderType::Assistant => "assistant",
            SenderType::System => "system",
        }
    }
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SenderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(SenderType::User),
            "assistant" => Ok(SenderType::Assistant),
            "system" => Ok(SenderType::System),
            other => Err(format!("unknown sender type '{other}'")),
        }
    }
}

/// How hard a recommendation is to put in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Low,
    #[default]
    Medium,
    High,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Low => "low",
            Difficulty::Medium => "medium",
            Difficulty::High => "high",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Difficulty::Low),
            "medium" => Ok(Difficulty::Medium),
            "high" => Ok(Difficulty::High),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

/// A single Anti-To-Do recommendation as returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub item: String,
    pub rationale: String,
    pub category: String,
    pub estimated_gain_minutes: i64,
    pub difficulty: Difficulty,
}

/// A candidate owner proposed by the model for an ownership query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerMatch {
    pub owner_name: String,
    pub owner_email: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
    pub rationale: String,
    pub confidence_score: f64,
}

/// A flattened ownership mapping (area + owner) used as model context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub area_name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub owner_name: String,
    pub owner_email: String,
    pub team: Option<String>,
    pub role: Option<String>,
}

/// One row of a product feature matrix, as submitted to ingestion.
///
/// Every field is optional on the wire; ingestion skips records that lack the
/// feature name or the owner's name and email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductMatrixRecord {
    #[serde(default)]
    pub feature_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A document returned by a vector-store similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub score: f64,
}
