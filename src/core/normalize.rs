//! Normalization of raw oracle JSON into typed results.
//!
//! Oracle output is untrusted: every field may be missing, mistyped or out of
//! range, and each one has a deterministic fallback.

use serde_json::Value;

use crate::core::scoring::round2;
use crate::models::{AgeGroup, PhotoAnalysis, PlayPreference, SizeClass, VideoAnalysis};
use crate::services::JsonObject;

/// Parse a numeric field from a number or numeric string
///
/// Infinities ("inf", "1e400") survive so callers clamp them to the range
/// bound; NaN is rejected.
fn parse_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (!number.is_nan()).then_some(number)
}

/// Similarity in [0, 100]; unparseable values count as 0
pub fn normalize_similarity(value: Option<&Value>) -> f64 {
    parse_number(value).unwrap_or(0.0).clamp(0.0, 100.0)
}

/// Boolean flag; accepts JSON booleans, "true"/"yes"/"1" strings and nonzero numbers
pub fn parse_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// Behaviour score in [0, 10], rounded to two decimals
pub fn clamp_dynamic(value: Option<&Value>) -> f64 {
    round2(parse_number(value).unwrap_or(0.0).clamp(0.0, 10.0))
}

fn text_or_unknown(value: Option<&Value>) -> String {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string().trim().to_string(),
    };
    if text.is_empty() {
        "unknown".to_string()
    } else {
        text
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Tags from a JSON array or a comma-separated string
pub fn normalize_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string().trim().to_string(),
            })
            .filter(|tag| !tag.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn normalize_photo(raw: &JsonObject) -> PhotoAnalysis {
    PhotoAnalysis {
        breed: text_or_unknown(raw.get("breed")),
        size: SizeClass::parse_lenient(&text(raw.get("size"))),
        age_group: AgeGroup::parse_lenient(&text(raw.get("age_group"))),
        appearance_tags: normalize_tags(raw.get("appearance_tags")),
        personality_guess: text_or_unknown(raw.get("personality_guess")),
    }
}

pub fn normalize_video(raw: &JsonObject) -> VideoAnalysis {
    VideoAnalysis {
        activity_level: clamp_dynamic(raw.get("activity_level")),
        approach_speed: clamp_dynamic(raw.get("approach_speed")),
        emotional_stability: clamp_dynamic(raw.get("emotional_stability")),
        play_preference: PlayPreference::parse_lenient(&text(raw.get("play_preference"))),
        body_language_score: clamp_dynamic(raw.get("body_language_score")),
    }
}

/// Verdict of a single notice/report comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleVerdict {
    pub similarity: f64,
    pub is_match: bool,
}

impl OracleVerdict {
    pub fn from_response(raw: &JsonObject) -> Self {
        Self {
            similarity: normalize_similarity(raw.get("similarity_score")),
            is_match: parse_flag(raw.get("is_match")),
        }
    }
}
