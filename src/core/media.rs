use std::path::Path;

use crate::core::error::CoreError;
use crate::models::ImageRef;
use crate::services::MediaPart;

/// Guess an image MIME type from the file extension, defaulting to JPEG
pub fn image_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

/// Resolve an image reference into an inline oracle part
pub async fn load_image(image: &ImageRef) -> Result<MediaPart, CoreError> {
    match image {
        ImageRef::Inline(bytes) => Ok(MediaPart::Inline {
            mime_type: "image/jpeg".to_string(),
            data: bytes.clone(),
        }),
        ImageRef::Path(path) => {
            let path = Path::new(path);
            let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    CoreError::MissingResource(format!("Image not found: {}", path.display()))
                }
                _ => CoreError::MissingResource(format!(
                    "Cannot read image {}: {}",
                    path.display(),
                    e
                )),
            })?;

            Ok(MediaPart::Inline {
                mime_type: image_mime_type(path).to_string(),
                data,
            })
        }
    }
}
