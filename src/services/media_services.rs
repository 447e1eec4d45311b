// Post image storage under MEDIA_ROOT/posts.
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use log::{info, warn};
use thiserror::Error;
use uuid::Uuid;

pub const POSTS_UPLOAD_DIR: &str = "posts";

const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Upload a valid image. Only JPEG, PNG, GIF, and WEBP are allowed.")]
    UnsupportedType,
    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    InvalidData,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image as it arrives in the post form.
#[derive(Debug, Clone)]
pub struct ImageUpload<'a> {
    pub data: &'a str,
    pub content_type: &'a str,
}

/// Image that passed type and payload checks, not yet written.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

impl ImageUpload<'_> {
    pub fn extension(&self) -> Result<&'static str, ImageError> {
        match self.content_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok("jpg"),
            "image/png" => Ok("png"),
            "image/gif" => Ok("gif"),
            "image/webp" => Ok("webp"),
            _ => Err(ImageError::UnsupportedType),
        }
    }

    /// Base64 payload, with any `data:image/...;base64,` prefix removed.
    pub fn decode(&self) -> Result<DecodedImage, ImageError> {
        let extension = self.extension()?;
        let payload = match self.data.split_once(',') {
            Some((_, rest)) => rest,
            None => self.data,
        };
        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|_| ImageError::InvalidData)?;
        if bytes.is_empty() {
            return Err(ImageError::InvalidData);
        }
        Ok(DecodedImage { bytes, extension })
    }
}

pub fn is_allowed_type(content_type: &str) -> bool {
    ALLOWED_TYPES.contains(&content_type.trim().to_ascii_lowercase().as_str())
}

/// Writes the image and returns its path relative to the media root,
/// e.g. `posts/<uuid>.png`.
pub async fn save_post_image(media_root: &Path, image: &DecodedImage) -> Result<String, ImageError> {
    let dir = media_root.join(POSTS_UPLOAD_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let filename = format!("{}.{}", Uuid::new_v4(), image.extension);
    tokio::fs::write(dir.join(&filename), &image.bytes).await?;
    info!("stored post image {} ({} bytes)", filename, image.bytes.len());

    Ok(format!("{}/{}", POSTS_UPLOAD_DIR, filename))
}

/// Removes an image written by `save_post_image` whose post never got
/// stored. Failures are logged, not returned.
pub async fn discard_post_image(media_root: &Path, stored: &str) {
    let Some(path) = post_image_path(media_root, stored) else {
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => info!("discarded unused post image {}", path.display()),
        Err(e) => warn!("could not discard post image {}: {}", path.display(), e),
    }
}

/// Resolves `posts/<file>` under the media root. Only the final path
/// component of `filename` is used.
pub fn post_image_path(media_root: &Path, filename: &str) -> Option<PathBuf> {
    let name = Path::new(filename).file_name()?.to_str()?;
    Some(media_root.join(POSTS_UPLOAD_DIR).join(name))
}
