//! Image data URLs
//!
//! The face photo travels as `data:image/<type>;base64,<payload>`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Prefix an image string must carry to be honoured
pub const IMAGE_DATA_URL_PREFIX: &str = "data:image";

/// Parsed base64 image data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// MIME type, e.g. "image/jpeg"
    pub media_type: String,
    /// Base64 payload (not decoded)
    pub data: String,
}

impl ImageData {
    /// Parse a `data:image/...;base64,...` URL
    ///
    /// Returns `None` for anything that is not a base64 image data URL.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let media_type = header.strip_suffix(";base64")?;
        if !media_type.starts_with("image/") || data.is_empty() {
            return None;
        }
        Some(Self {
            media_type: media_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Encode raw image bytes
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// True if the client-supplied image string should be forwarded
pub fn is_image_data_url(value: &str) -> bool {
    value.starts_with(IMAGE_DATA_URL_PREFIX)
}
