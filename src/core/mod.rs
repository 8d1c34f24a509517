//! Core functionality for the uploader
//!
//! This module contains the upload orchestration logic and its data structures.

pub mod upload;

pub use upload::{BatchSummary, BatchUploader, FileBlob, UploadItem, UploadState};
