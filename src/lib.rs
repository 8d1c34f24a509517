//! # uploader-rs
//!
//! Batch file upload orchestrator for pre-signed URLs.
//!
//! Given a list of (file, destination URL) pairs, the orchestrator compresses
//! eligible images, uploads every item concurrently via HTTP PUT, tracks
//! per-item progress and errors, and exposes aggregate completion state plus
//! retry and cancellation controls.
//!
//! ## Features
//!
//! - **Signature diffing**: items are identified by a composite signature of
//!   URL and file metadata, so re-submitting an unchanged batch performs zero
//!   network activity
//! - **Per-item isolation**: a failed or cancelled item never affects its
//!   siblings
//! - **Best-effort image compression**: resize and re-encode before upload,
//!   falling back to the original file when compression fails
//! - **Cancellation**: per-item or whole-batch, distinguished from failure
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use uploader_rs::{BatchUploader, FileBlob, UploadItem, UploaderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let uploader = BatchUploader::new(UploaderConfig::default())?;
//!
//!     let file = FileBlob::from_path("photo.jpg").await?;
//!     let url = "https://bucket.example/photo.jpg?signature=...".to_string();
//!     uploader.submit(vec![UploadItem::new(file, Some(url))]);
//!
//!     while !uploader.is_all_uploaded() && !uploader.is_any_error() {
//!         tokio::time::sleep(std::time::Duration::from_millis(100)).await;
//!     }
//!
//!     println!("progress: {}", uploader.total_progress());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

// Public module exports
pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::{ImageCompressionConfig, UploaderConfig};
pub use core::upload::{
    BatchSummary, BatchUploader, FileBlob, Signature, UploadItem, UploadState,
};
pub use utils::error::{Result, UploadError};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
