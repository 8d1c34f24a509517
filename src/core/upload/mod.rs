//! Batch file upload with progress tracking, compression and cancellation
//!
//! This module implements the upload orchestrator: per-item state keyed by
//! content signature, signature diffing across submissions, best-effort image
//! compression, and concurrent cancellable PUT transfers.

mod compression;
mod orchestrator;
mod transfer;
mod types;


// Re-export all public types
pub use compression::compress_image;
pub use orchestrator::BatchUploader;
pub use transfer::put_with_progress;
pub use types::{
    BatchSummary, FileBlob, Signature, UploadItem, UploadState, content_type_for_extension,
};
