use crate::config::MediaConfig;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Largest decoded image accepted from a data URL.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("payload is not an image data URL")]
    NotAnImage,
    #[error("data URL has no base64 payload")]
    MissingPayload,
    #[error("unsupported image extension {0:?}")]
    BadExtension(String),
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image is {0} bytes, limit is {MAX_IMAGE_BYTES}")]
    TooLarge(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Decode `data:image/<ext>;base64,<payload>`.
pub fn decode_data_url(value: &str) -> Result<DecodedImage, ImageError> {
    let rest = value
        .strip_prefix("data:image/")
        .ok_or(ImageError::NotAnImage)?;
    let (extension, payload) = rest
        .split_once(";base64,")
        .ok_or(ImageError::MissingPayload)?;

    let extension = extension.to_ascii_lowercase();
    if extension.is_empty() || !extension.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ImageError::BadExtension(extension));
    }

    // Reject on the encoded length first so oversized payloads are never decoded.
    if payload.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
        return Err(ImageError::TooLarge(payload.len() / 4 * 3));
    }

    let bytes = STANDARD.decode(payload.trim())?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge(bytes.len()));
    }

    Ok(DecodedImage { extension, bytes })
}

/// Filesystem store for uploaded images.
///
/// Stored references are paths relative to the media root, e.g.
/// `recipes/images/<uuid>.png`; clients see them prefixed with the media URL.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url: String,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self::from_parts(&config.root, &config.url)
    }

    pub fn from_parts(root: impl Into<PathBuf>, url: &str) -> Self {
        let mut url = url.to_string();
        if !url.ends_with('/') {
            url.push('/');
        }
        MediaStore {
            root: root.into(),
            url,
        }
    }

    pub async fn save(&self, folder: &str, image: &DecodedImage) -> std::io::Result<String> {
        let relative = format!("{}/{}.{}", folder, Uuid::new_v4(), image.extension);
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &image.bytes).await?;
        log::debug!("Stored image at {}", path.display());
        Ok(relative)
    }

    /// Remove a stored file. Failures are logged and otherwise ignored.
    pub async fn delete(&self, relative: &str) {
        if relative.contains("..") {
            log::warn!("Refusing to delete media path {:?}", relative);
            return;
        }
        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            log::warn!("Failed to remove media file {}: {:?}", path.display(), e);
        }
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}{}", self.url, relative)
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}
