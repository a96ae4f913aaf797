//! Image upload validation and persistence.
//!
//! Files arrive as the `image` field of a multipart form. The content type
//! is checked before any data is read, and the size limit is enforced
//! while streaming. Nothing touches the disk until the whole file passed
//! both checks.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::UploadConfig;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

const DEFAULT_EXTENSION: &str = "png";
const MAX_NAME_ATTEMPTS: i64 = 16;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No image file provided")]
    MissingFile,

    #[error("Only image files are allowed")]
    UnsupportedType(Option<String>),

    #[error("Upload error: File too large")]
    TooLarge { limit: usize },

    #[error("Upload error: {0}")]
    Malformed(String),

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn from_multipart(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge { limit }
        } else {
            UploadError::Malformed(err.body_text())
        }
    }
}

/// An image held in memory while it is being received.
#[derive(Debug)]
pub struct PendingImage {
    original_name: Option<String>,
    data: Vec<u8>,
    limit: usize,
}

impl PendingImage {
    pub fn new(original_name: Option<String>, limit: usize) -> Self {
        Self {
            original_name,
            data: Vec::new(),
            limit,
        }
    }

    /// Append a chunk, failing as soon as the limit is crossed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        if self.data.len() + chunk.len() > self.limit {
            return Err(UploadError::TooLarge { limit: self.limit });
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    /// Bytes received so far.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A stored upload, serialized into the success response.
#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    pub success: bool,
    pub path: String,
    pub filename: String,
    pub size: usize,
}

/// Name for a stored image: `pasted-<millis>.<ext>`, keeping the original
/// extension when it is a plain alphanumeric one.
pub fn file_name_for(original: Option<&str>, millis: i64) -> String {
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 10 && !ext.is_empty())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(DEFAULT_EXTENSION);
    format!("pasted-{millis}.{ext}")
}

/// Upload directory plus acceptance rules.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_file_bytes: usize,
    allowed_types: Vec<String>,
}

impl UploadStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_file_bytes: config.max_file_bytes,
            allowed_types: config
                .allowed_types
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_file_bytes(&self) -> usize {
        self.max_file_bytes
    }

    /// Create the upload directory if it is missing. Returns whether it
    /// had to be created.
    pub async fn ensure_dir(&self) -> std::io::Result<bool> {
        if tokio::fs::try_exists(&self.dir).await? {
            return Ok(false);
        }
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o755);
        builder.create(&self.dir).await?;
        Ok(true)
    }

    /// Accept only the configured content types. Parameters such as
    /// `; charset=` are ignored.
    pub fn check_content_type(&self, content_type: Option<&str>) -> Result<(), UploadError> {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match essence {
            Some(ct) if self.allowed_types.iter().any(|allowed| *allowed == ct) => Ok(()),
            other => Err(UploadError::UnsupportedType(other)),
        }
    }

    /// Read the `image` field out of a multipart body and store it.
    pub async fn receive(&self, mut multipart: Multipart) -> Result<StoredImage, UploadError> {
        let limit = self.max_file_bytes;
        let mut image = None;

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::from_multipart(e, limit))?
        {
            // Fields without a filename are plain form values, not files.
            if field.name() != Some(IMAGE_FIELD) || field.file_name().is_none() || image.is_some()
            {
                continue;
            }

            self.check_content_type(field.content_type())?;

            let mut pending = PendingImage::new(field.file_name().map(str::to_owned), limit);
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| UploadError::from_multipart(e, limit))?
            {
                pending.push(&chunk)?;
            }
            image = Some(pending);
        }

        let image = image.ok_or(UploadError::MissingFile)?;
        self.save(image).await
    }

    /// Write a fully received image under a fresh name.
    pub async fn save(&self, image: PendingImage) -> Result<StoredImage, UploadError> {
        let mut millis = chrono::Utc::now().timestamp_millis();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let filename = file_name_for(image.original_name.as_deref(), millis);
            let path = self.dir.join(&filename);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    millis += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let written = match file.write_all(&image.data).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e.into());
            }

            return Ok(StoredImage {
                success: true,
                path: path.to_string_lossy().into_owned(),
                filename,
                size: image.size(),
            });
        }

        Err(UploadError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "could not find a free upload file name",
        )))
    }
}
