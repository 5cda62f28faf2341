//! Vision/LLM oracle port.
//!
//! One capability is exposed to the core: send a prompt plus media parts and
//! get a JSON object back. SDK or API-version differences stay inside the
//! adapters ([`GeminiClient`](super::GeminiClient), [`MockOracle`](super::MockOracle)).

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// JSON object returned by the oracle
pub type JsonObject = Map<String, Value>;

/// Errors that can occur when talking to the oracle
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("Oracle returned error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Could not parse oracle response: {0}")]
    Parse(String),

    #[error("Oracle call timed out after {0}s")]
    Timeout(u64),

    #[error("File processing failed: {0}")]
    Upload(String),

    #[error("Oracle misconfigured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        // request URLs name uploaded files; keep them out of client-facing text
        OracleError::Request(err.without_url())
    }
}

/// Media attached to an oracle request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPart {
    /// Bytes sent inline with the request
    Inline { mime_type: String, data: Vec<u8> },
    /// A file previously uploaded to the oracle's file store
    File {
        name: String,
        uri: String,
        mime_type: String,
    },
}

/// Which model family serves the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Image,
    Video,
}

/// Sampling options for a single oracle call
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub model: ModelKind,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl GenerationOptions {
    pub fn image(temperature: f64) -> Self {
        Self {
            model: ModelKind::Image,
            temperature,
            max_output_tokens: 2048,
        }
    }

    pub fn video(temperature: f64) -> Self {
        Self {
            model: ModelKind::Video,
            temperature,
            max_output_tokens: 2048,
        }
    }
}

#[async_trait]
pub trait VisionOracle: Send + Sync {
    /// Run the prompt over the media parts and return the parsed JSON object
    async fn generate_json(
        &self,
        prompt: &str,
        parts: &[MediaPart],
        options: &GenerationOptions,
    ) -> Result<JsonObject, OracleError>;

    /// Upload a video so it can be referenced from `generate_json`
    async fn upload_video(&self, path: &Path) -> Result<MediaPart, OracleError>;

    /// Release an uploaded file. Inline parts need no cleanup.
    async fn release(&self, _part: &MediaPart) -> Result<(), OracleError> {
        Ok(())
    }
}

/// Parse model output into a JSON object
///
/// Tries, in order: the whole text, a fenced ```json block, and the slice
/// between the first `{` and the last `}`.
pub fn parse_json_object(raw_text: &str) -> Result<JsonObject, OracleError> {
    let text = raw_text.trim();
    if text.is_empty() {
        return Err(OracleError::Parse("response is empty".to_string()));
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Ok(map);
    }

    if let Some(block) = extract_fenced_block(text) {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(block) {
            return Ok(map);
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Ok(map);
            }
        }
    }

    let preview: String = text.chars().take(300).collect();
    Err(OracleError::Parse(format!(
        "not a JSON object: {}",
        preview
    )))
}

fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body = after_fence.strip_prefix("json").unwrap_or(after_fence);
    let end = body.find("```")?;
    Some(body[..end].trim())
}
