//! # Terminal Output
//!
//! Plain-text rendering of service responses.

use leverage::types::RecommendationItem;
use serde_json::Value;
use std::fmt::Write;

/// Renders recommendations grouped by category, in first-seen order.
pub fn format_recommendations(items: &[RecommendationItem]) -> String {
    if items.is_empty() {
        return "No recommendations returned.\n".to_string();
    }

    let mut categories: Vec<(&str, Vec<&RecommendationItem>)> = Vec::new();
    for item in items {
        match categories.iter_mut().find(|(name, _)| *name == item.category) {
            Some((_, group)) => group.push(item),
            None => categories.push((&item.category, vec![item])),
        }
    }

    let mut out = String::new();
    for (name, group) in categories {
        let _ = writeln!(out, "📂 {name}");
        for (i, item) in group.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} (~{} min, {})",
                i + 1,
                item.item,
                item.estimated_gain_minutes,
                item.difficulty
            );
            if !item.rationale.is_empty() {
                let _ = writeln!(out, "     {}", item.rationale);
            }
        }
        out.push('\n');
    }
    out
}

/// Renders an ownership resolution (direct or retrieval).
pub fn format_resolution(resolution: &Value) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Ticket #{}", resolution["ticket_id"]);

    match resolution.get("best_match").filter(|m| !m.is_null()) {
        Some(best) => {
            let _ = writeln!(
                out,
                "Best match: {} <{}> ({:.0}% confident)",
                best["owner_name"].as_str().unwrap_or_default(),
                best["owner_email"].as_str().unwrap_or_default(),
                best["confidence_score"].as_f64().unwrap_or_default() * 100.0
            );
            if let Some(rationale) = best["rationale"].as_str() {
                let _ = writeln!(out, "  {rationale}");
            }
        }
        None => {
            let _ = writeln!(out, "No owner found.");
        }
    }

    if resolution["needs_review"].as_bool().unwrap_or(false) {
        let _ = writeln!(out, "⚠️  Needs human review.");
    }
    if let Some(confidence) = resolution["retrieval_confidence"].as_f64() {
        let _ = writeln!(out, "Retrieval confidence: {confidence:.2}");
    }
    out
}
