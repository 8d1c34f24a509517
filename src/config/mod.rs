//! Configuration management for the uploader
//!
//! This module handles loading, validation, and defaults for uploader configuration.

use crate::utils::error::{Result, UploadError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Main configuration struct for the uploader
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Image compression settings applied to image items before upload
    pub image_compression: ImageCompressionConfig,

    /// Overall per-request timeout in seconds; unset means no timeout
    pub request_timeout_secs: Option<u64>,
}

/// Image compression settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageCompressionConfig {
    /// Whether image items are compressed before upload
    pub is_enabled: bool,

    /// Target maximum output size in megabytes
    pub max_size_mb: f64,

    /// Maximum width or height of the output image in pixels
    pub max_width_or_height: u32,
}

impl Default for ImageCompressionConfig {
    fn default() -> Self {
        Self {
            is_enabled: true,
            max_size_mb: 0.8,
            max_width_or_height: 1920,
        }
    }
}

impl UploaderConfig {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| UploadError::Config(format!("Failed to read config file: {}", e)))?;

        let config: UploaderConfig = serde_yaml::from_str(&content)
            .map_err(|e| UploadError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        let compression = &self.image_compression;

        if compression.max_size_mb <= 0.0 {
            return Err(UploadError::Config(format!(
                "image_compression.max_size_mb must be positive, got {}",
                compression.max_size_mb
            )));
        }

        if compression.max_width_or_height == 0 {
            return Err(UploadError::Config(
                "image_compression.max_width_or_height must be positive".to_string(),
            ));
        }

        if let Some(0) = self.request_timeout_secs {
            return Err(UploadError::Config(
                "request_timeout_secs must be positive when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Build an HTTP client configured per this config
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder.build()?)
    }
}
