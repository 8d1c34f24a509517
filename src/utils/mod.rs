//! Utility modules for the uploader
//!
//! - **error**: Error handling types shared across the crate
//! - **logging**: Tracing subscriber setup for binaries

pub mod error;
pub mod logging;

pub use error::{Result, UploadError};
