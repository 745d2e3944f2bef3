//! Uploaded media on disk
//!
//! Photos are stored as `<media_root>/photos/<photo_id>.<ext>` and served
//! back under `/media`. The database only keeps the path and public URL.
//! Naming by photo id keeps a file tied to its row when the row is moved
//! to another employee.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Media storage errors
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("unsupported content type '{0}', expected an image")]
    UnsupportedType(String),

    #[error("media IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a stored file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Filesystem path
    pub path: String,
    /// Public URL
    pub url: String,
}

/// File store rooted at the media directory
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, base_site_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: format!("{}/media", base_site_url.trim_end_matches('/')),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a photo file, replacing any earlier file of the same photo and type.
    pub async fn save_photo(
        &self,
        photo_id: Uuid,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, MediaError> {
        let ext = image_extension(content_type)?;
        let dir = self.root.join("photos");
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{photo_id}.{ext}");
        let path = dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "photo written");
        Ok(StoredFile {
            path: path.to_string_lossy().into_owned(),
            url: format!("{}/photos/{file_name}", self.base_url),
        })
    }

    /// Remove a stored file. A file that is already gone is only logged.
    pub async fn remove(&self, path: &str) -> Result<(), MediaError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path, "media file already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// File extension for an accepted image content type.
pub fn image_extension(content_type: &str) -> Result<&'static str, MediaError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/gif" => Ok("gif"),
        "image/webp" => Ok("webp"),
        _ => Err(MediaError::UnsupportedType(content_type.to_owned())),
    }
}
