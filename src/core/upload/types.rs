//! Types for the batch upload orchestrator

use crate::utils::error::{Result, UploadError};
use bytes::Bytes;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

/// An in-memory file with the metadata needed for upload
#[derive(Debug, Clone)]
pub struct FileBlob {
    /// File name, including extension
    pub name: String,
    /// MIME type sent as the `Content-Type` header
    pub content_type: String,
    /// Last modification time in milliseconds since the Unix epoch
    pub last_modified: i64,
    /// File contents
    pub bytes: Bytes,
}

impl FileBlob {
    /// Create a blob from raw bytes
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        last_modified: i64,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            last_modified,
            bytes: bytes.into(),
        }
    }

    /// Load a blob from disk, guessing the content type from the extension
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let name = path
            .file_name()
            .ok_or_else(|| {
                UploadError::InvalidRequest(format!("Path has no file name: {:?}", path))
            })?
            .to_string_lossy()
            .into_owned();

        let metadata = tokio::fs::metadata(path).await?;
        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let content_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(content_type_for_extension)
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = Bytes::from(tokio::fs::read(path).await?);

        Ok(Self {
            name,
            content_type,
            last_modified,
            bytes,
        })
    }

    /// File size in bytes
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether this blob is an image, by MIME type
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Map a file extension to a MIME type
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        "pdf" => Some("application/pdf"),
        "json" => Some("application/json"),
        "txt" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "html" => Some("text/html"),
        "mp3" => Some("audio/mpeg"),
        "mp4" => Some("video/mp4"),
        "zip" => Some("application/zip"),
        _ => None,
    }
}

/// A single file/destination pair submitted for upload
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// File to upload
    pub file: FileBlob,
    /// Pre-signed destination URL; `None` means the item is not yet ready to upload
    pub url: Option<String>,
}

impl UploadItem {
    /// Create an upload item
    pub fn new(file: FileBlob, url: Option<String>) -> Self {
        Self { file, url }
    }

    /// Composite identity of this item, derived from the destination URL and
    /// file metadata. Identical re-submissions produce the same signature, so
    /// state survives across `submit` calls without an assigned identifier.
    pub fn signature(&self) -> Signature {
        Signature(format!(
            "{}|{}|{}|{}|{}",
            self.url.as_deref().unwrap_or(""),
            self.file.name,
            self.file.size(),
            self.file.last_modified,
            self.file.content_type
        ))
    }
}

/// Composite key correlating an item's state across submissions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-item upload state
#[derive(Debug, Clone)]
pub struct UploadState {
    /// Upload progress as a fraction in `[0, 1]`
    pub progress: f64,
    /// True while the item has not started its network transfer
    /// (waiting for a URL, or compressing)
    pub is_preparing: bool,
    /// True once the destination acknowledged the upload
    pub is_uploaded: bool,
    /// Recorded failure, if any; cancellations are never recorded here
    pub error: Option<Arc<UploadError>>,
}

impl UploadState {
    /// State of an item that has been observed but not progressed yet
    pub fn pending() -> Self {
        Self {
            progress: 0.0,
            is_preparing: true,
            is_uploaded: false,
            error: None,
        }
    }

    /// Whether this item has settled: either uploaded or failed
    pub fn is_settled(&self) -> bool {
        self.is_uploaded || self.error.is_some()
    }
}

/// Aggregate view over a batch of upload states
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Arithmetic mean of per-item progress; `0` for an empty batch
    pub total_progress: f64,
    /// True iff the batch is non-empty and every item is uploaded
    pub is_all_uploaded: bool,
    /// True iff any item has a recorded error
    pub is_any_error: bool,
    /// True iff any item is still preparing
    pub is_preparing_any: bool,
}

impl BatchSummary {
    /// Derive a summary from a slice of per-item states
    pub fn from_states(states: &[UploadState]) -> Self {
        let total_progress = if states.is_empty() {
            0.0
        } else {
            states.iter().map(|s| s.progress).sum::<f64>() / states.len() as f64
        };

        Self {
            total_progress,
            is_all_uploaded: !states.is_empty() && states.iter().all(|s| s.is_uploaded),
            is_any_error: states.iter().any(|s| s.error.is_some()),
            is_preparing_any: states.iter().any(|s| s.is_preparing),
        }
    }
}
