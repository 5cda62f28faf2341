use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::services::oracle::{
    GenerationOptions, JsonObject, MediaPart, OracleError, VisionOracle,
};

/// Offline oracle for local runs without Gemini credentials
///
/// Dispatches on the prompt's requested keys. Image comparisons are
/// deterministic: identical bytes score 95, anything else lands in [40, 92]
/// based on a SHA-256 fingerprint of both images.
#[derive(Debug, Default, Clone)]
pub struct MockOracle;

impl MockOracle {
    pub fn new() -> Self {
        Self
    }

    /// Fingerprint-based similarity for the first two inline parts
    pub fn mock_similarity(parts: &[MediaPart]) -> f64 {
        let (Some(left), Some(right)) = (
            parts.first().and_then(inline_bytes),
            parts.get(1).and_then(inline_bytes),
        ) else {
            return 55.0;
        };

        if left.is_empty() || right.is_empty() {
            return 55.0;
        }
        if left == right {
            return 95.0;
        }

        let mut hasher = Sha256::new();
        hasher.update(&left[..left.len().min(1024)]);
        hasher.update(&right[..right.len().min(1024)]);
        let digest = hasher.finalize();
        let bucket = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) % 100;

        f64::from(bucket.clamp(40, 92))
    }
}

fn inline_bytes(part: &MediaPart) -> Option<&[u8]> {
    match part {
        MediaPart::Inline { data, .. } => Some(data),
        MediaPart::File { .. } => None,
    }
}

fn into_object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

#[async_trait]
impl VisionOracle for MockOracle {
    async fn generate_json(
        &self,
        prompt: &str,
        parts: &[MediaPart],
        _options: &GenerationOptions,
    ) -> Result<JsonObject, OracleError> {
        let prompt = prompt.to_lowercase();

        if prompt.contains("\"activity_level\"") && prompt.contains("\"approach_speed\"") {
            return Ok(into_object(json!({
                "activity_level": 7.2,
                "approach_speed": 6.8,
                "emotional_stability": 7.9,
                "play_preference": "chase",
                "body_language_score": 7.1,
            })));
        }

        if prompt.contains("\"similarity_score\"") && prompt.contains("\"is_match\"") {
            let score = Self::mock_similarity(parts);
            return Ok(into_object(json!({
                "breed_match": score >= 60.0,
                "coat_pattern_similarity": (score - 5.0).clamp(0.0, 100.0),
                "body_size_similarity": (score - 8.0).clamp(0.0, 100.0),
                "face_feature_similarity": (score - 3.0).clamp(0.0, 100.0),
                "special_mark_similarity": (score - 10.0).clamp(0.0, 100.0),
                "similarity_score": score,
                "is_match": score >= 70.0,
                "reason": "Mock comparison based on deterministic byte fingerprint.",
            })));
        }

        Ok(into_object(json!({
            "breed": "mixed (labrador + border collie)",
            "size": "medium",
            "age_group": "adult",
            "appearance_tags": ["short_coat", "semi_floppy_ears", "black_white"],
            "personality_guess": "friendly, energetic, and people-oriented",
        })))
    }

    async fn upload_video(&self, path: &Path) -> Result<MediaPart, OracleError> {
        Ok(MediaPart::File {
            name: "mock-video".to_string(),
            uri: path.display().to_string(),
            mime_type: "video/mp4".to_string(),
        })
    }
}
