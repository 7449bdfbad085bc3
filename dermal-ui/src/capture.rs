//! Face photo capture from a file

use dermal_common::image::ImageData;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a recognized image file: {0}")]
    NotAnImage(String),
}

/// Encode image bytes as a data URL, detecting the type from magic bytes
pub fn image_data_url(bytes: &[u8]) -> Option<String> {
    let kind = infer::get(bytes)?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return None;
    }
    Some(ImageData::from_bytes(kind.mime_type(), bytes).to_data_url())
}

/// Read an image file into a `data:image/...;base64,` URL
pub fn load_image(path: &Path) -> Result<String, CaptureError> {
    let bytes = std::fs::read(path).map_err(|source| CaptureError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let url = image_data_url(&bytes)
        .ok_or_else(|| CaptureError::NotAnImage(path.display().to_string()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Image captured");
    Ok(url)
}
