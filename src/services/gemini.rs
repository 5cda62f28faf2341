use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

use crate::config::GeminiSettings;
use crate::services::oracle::{
    parse_json_object, GenerationOptions, JsonObject, MediaPart, ModelKind, OracleError,
    VisionOracle,
};

/// Credentials travel in this header, never in the URL
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini REST client
///
/// Handles all communication with the Generative Language API:
/// - `generateContent` calls with JSON response mode
/// - File API uploads for videos, polled until ACTIVE
/// - Cleanup of uploaded files
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    image_model: String,
    video_model: String,
    client: Client,
    upload_timeout: Duration,
    poll_interval: Duration,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(
        base_url: String,
        api_key: String,
        image_model: String,
        video_model: String,
        request_timeout: Duration,
    ) -> Result<Self, OracleError> {
        if api_key.trim().is_empty() {
            return Err(OracleError::Config("missing Gemini API key".to_string()));
        }

        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            image_model,
            video_model,
            client,
            upload_timeout: Duration::from_secs(180),
            poll_interval: Duration::from_secs(2),
        })
    }

    /// Create a client from settings; fails when no API key is configured
    pub fn from_settings(settings: &GeminiSettings) -> Result<Self, OracleError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| OracleError::Config("missing Gemini API key".to_string()))?;

        Ok(Self::new(
            settings.base_url.clone(),
            api_key,
            settings.image_model.clone(),
            settings.video_model.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )?
        .with_upload_polling(
            Duration::from_secs(settings.upload_timeout_secs),
            Duration::from_millis(settings.upload_poll_interval_ms),
        ))
    }

    pub fn with_upload_polling(mut self, timeout: Duration, interval: Duration) -> Self {
        self.upload_timeout = timeout;
        self.poll_interval = interval;
        self
    }

    fn model_name(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Image => &self.image_model,
            ModelKind::Video => &self.video_model,
        }
    }

    fn request_body(prompt: &str, parts: &[MediaPart], options: &GenerationOptions) -> Value {
        let mut content_parts = vec![json!({ "text": prompt })];
        for part in parts {
            content_parts.push(match part {
                MediaPart::Inline { mime_type, data } => json!({
                    "inline_data": {
                        "mime_type": mime_type,
                        "data": base64::engine::general_purpose::STANDARD.encode(data),
                    }
                }),
                MediaPart::File { uri, mime_type, .. } => json!({
                    "file_data": {
                        "mime_type": mime_type,
                        "file_uri": uri,
                    }
                }),
            });
        }

        json!({
            "contents": [{ "role": "user", "parts": content_parts }],
            "generationConfig": {
                "temperature": options.temperature,
                "responseMimeType": "application/json",
                "maxOutputTokens": options.max_output_tokens,
            }
        })
    }

    /// Concatenate the text parts of every candidate
    fn extract_text(response: &Value) -> String {
        let mut chunks: Vec<&str> = Vec::new();
        if let Some(candidates) = response.get("candidates").and_then(|c| c.as_array()) {
            for candidate in candidates {
                let parts = candidate
                    .pointer("/content/parts")
                    .and_then(|p| p.as_array());
                for part in parts.into_iter().flatten() {
                    if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                        if !text.is_empty() {
                            chunks.push(text);
                        }
                    }
                }
            }
        }
        chunks.join("\n").trim().to_string()
    }

    async fn error_from_response(response: reqwest::Response) -> OracleError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(body);

        OracleError::Api { status, message }
    }

    fn file_part(file: &Value) -> Result<MediaPart, OracleError> {
        let field = |name: &str| {
            file.get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| OracleError::Upload(format!("file metadata missing `{}`", name)))
        };

        Ok(MediaPart::File {
            name: field("name")?,
            uri: field("uri")?,
            mime_type: file
                .get("mimeType")
                .and_then(|v| v.as_str())
                .unwrap_or("video/mp4")
                .to_string(),
        })
    }

    fn file_state(file: &Value) -> String {
        file.get("state")
            .and_then(|s| s.as_str())
            .unwrap_or("ACTIVE")
            .to_uppercase()
    }

    async fn wait_until_active(&self, name: &str) -> Result<Value, OracleError> {
        let deadline = tokio::time::Instant::now() + self.upload_timeout;
        let url = format!("{}/v1beta/{}", self.base_url, name);

        loop {
            let response = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::error_from_response(response).await);
            }

            let file: Value = response.json().await?;
            match Self::file_state(&file).as_str() {
                "ACTIVE" => return Ok(file),
                "FAILED" => {
                    return Err(OracleError::Upload(format!(
                        "Gemini file processing failed for {}",
                        name
                    )))
                }
                state => tracing::debug!("File {} is {}, polling again", name, state),
            }

            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(OracleError::Timeout(self.upload_timeout.as_secs()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Guess a video MIME type from the file extension
pub fn video_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("mpeg") | Some("mpg") => "video/mpeg",
        _ => "video/mp4",
    }
}

#[async_trait]
impl VisionOracle for GeminiClient {
    async fn generate_json(
        &self,
        prompt: &str,
        parts: &[MediaPart],
        options: &GenerationOptions,
    ) -> Result<JsonObject, OracleError> {
        let model = self.model_name(options.model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(model)
        );

        tracing::debug!("Calling Gemini model {} with {} media parts", model, parts.len());

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::request_body(prompt, parts, options))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: Value = response.json().await?;
        parse_json_object(&Self::extract_text(&body))
    }

    async fn upload_video(&self, path: &Path) -> Result<MediaPart, OracleError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| OracleError::Upload(format!("cannot read {}: {}", path.display(), e)))?;
        let mime_type = video_mime_type(path);

        let url = format!("{}/upload/v1beta/files", self.base_url);

        tracing::info!("Uploading video {} ({} bytes)", path.display(), bytes.len());

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", mime_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: Value = response.json().await?;
        let file = body.get("file").unwrap_or(&body);
        let name = file
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| OracleError::Upload("upload response has no file name".to_string()))?;

        if Self::file_state(file) == "ACTIVE" {
            return Self::file_part(file);
        }

        let active = self.wait_until_active(name).await?;
        Self::file_part(&active)
    }

    async fn release(&self, part: &MediaPart) -> Result<(), OracleError> {
        let MediaPart::File { name, .. } = part else {
            return Ok(());
        };

        let url = format!("{}/v1beta/{}", self.base_url, name);

        let response = self
            .client
            .delete(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        tracing::debug!("Released uploaded file {}", name);
        Ok(())
    }
}
