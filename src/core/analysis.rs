use std::path::Path;
use std::sync::Arc;

use crate::core::error::CoreError;
use crate::core::media::load_image;
use crate::core::normalize::{normalize_photo, normalize_video};
use crate::models::{ImageRef, PhotoAnalysis, VideoAnalysis};
use crate::services::{GenerationOptions, PetStore, VisionOracle};

/// Tags a pet photo with breed, size, age group and appearance traits
pub struct PhotoAnalyzer {
    oracle: Arc<dyn VisionOracle>,
    prompt: String,
    temperature: f64,
}

impl PhotoAnalyzer {
    pub fn new(oracle: Arc<dyn VisionOracle>, prompt: String, temperature: f64) -> Self {
        Self {
            oracle,
            prompt,
            temperature,
        }
    }

    pub async fn analyze(&self, image: &ImageRef) -> Result<PhotoAnalysis, CoreError> {
        let part = load_image(image).await?;
        let raw = self
            .oracle
            .generate_json(&self.prompt, &[part], &GenerationOptions::image(self.temperature))
            .await?;

        Ok(normalize_photo(&raw))
    }

    /// Analyze and store the result as the pet's AI tags
    pub async fn analyze_and_persist(
        &self,
        pet_id: &str,
        image: &ImageRef,
        pets: &dyn PetStore,
    ) -> Result<PhotoAnalysis, CoreError> {
        let analysis = self.analyze(image).await?;
        pets.update_ai_tags(pet_id, &analysis).await?;
        tracing::info!("Stored photo analysis for pet {}", pet_id);
        Ok(analysis)
    }
}

/// Extracts behaviour scores from a pet video
pub struct VideoAnalyzer {
    oracle: Arc<dyn VisionOracle>,
    prompt: String,
    temperature: f64,
}

impl VideoAnalyzer {
    pub fn new(oracle: Arc<dyn VisionOracle>, prompt: String, temperature: f64) -> Self {
        Self {
            oracle,
            prompt,
            temperature,
        }
    }

    /// Upload the video, analyze it and release the upload
    ///
    /// The upload is released even when analysis fails.
    pub async fn analyze(&self, video_path: &str) -> Result<VideoAnalysis, CoreError> {
        let path = Path::new(video_path);
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(CoreError::MissingResource(format!(
                "Video not found: {}",
                video_path
            )));
        }

        let uploaded = self.oracle.upload_video(path).await?;
        let result = self
            .oracle
            .generate_json(
                &self.prompt,
                std::slice::from_ref(&uploaded),
                &GenerationOptions::video(self.temperature),
            )
            .await;

        if let Err(e) = self.oracle.release(&uploaded).await {
            tracing::warn!("Failed to release uploaded video {}: {}", video_path, e);
        }

        Ok(normalize_video(&result?))
    }

    /// Analyze and append the result to the pet's dynamic info
    pub async fn analyze_and_persist(
        &self,
        pet_id: &str,
        video_path: &str,
        pets: &dyn PetStore,
    ) -> Result<VideoAnalysis, CoreError> {
        let analysis = self.analyze(video_path).await?;
        pets.append_dynamic_info(pet_id, video_path, &analysis).await?;
        tracing::info!("Stored video analysis for pet {}", pet_id);
        Ok(analysis)
    }
}
