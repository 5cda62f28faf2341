use std::path::Path;

use crate::core::error::CoreError;

const PHOTO_ANALYSIS_FILE: &str = "photo_analysis_prompt.txt";
const VIDEO_BEHAVIOR_FILE: &str = "video_behavior_prompt.txt";
const LOST_DOG_MATCH_FILE: &str = "lost_dog_match_prompt.txt";

/// Prompt texts sent to the vision oracle
#[derive(Debug, Clone)]
pub struct Prompts {
    pub photo_analysis: String,
    pub video_behavior: String,
    pub lost_dog_match: String,
}

impl Prompts {
    /// Prompts compiled into the binary
    pub fn builtin() -> Self {
        Self {
            photo_analysis: include_str!("../../prompts/photo_analysis_prompt.txt").to_string(),
            video_behavior: include_str!("../../prompts/video_behavior_prompt.txt").to_string(),
            lost_dog_match: include_str!("../../prompts/lost_dog_match_prompt.txt").to_string(),
        }
    }

    /// Load prompts from a directory, or use the built-in ones when `dir` is `None`
    ///
    /// Every prompt file must exist in the directory.
    pub fn load(dir: Option<&Path>) -> Result<Self, CoreError> {
        let Some(dir) = dir else {
            return Ok(Self::builtin());
        };

        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read_to_string(&path).map_err(|_| {
                CoreError::MissingResource(format!("Prompt file not found: {}", path.display()))
            })
        };

        Ok(Self {
            photo_analysis: read(PHOTO_ANALYSIS_FILE)?,
            video_behavior: read(VIDEO_BEHAVIOR_FILE)?,
            lost_dog_match: read(LOST_DOG_MATCH_FILE)?,
        })
    }
}
