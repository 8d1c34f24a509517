//! Best-effort image compression applied before upload
//!
//! Compression failures never abort an upload; the orchestrator falls back to
//! the original file and logs a warning.

use super::types::FileBlob;
use crate::config::ImageCompressionConfig;
use crate::utils::error::{Result, UploadError};
use bytes::Bytes;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use std::path::Path;
use tracing::debug;

/// Quality floor for the JPEG size-reduction loop
const MIN_JPEG_QUALITY: u8 = 30;

/// Initial JPEG quality
const INITIAL_JPEG_QUALITY: u8 = 85;

/// Compress an image blob according to `config`.
///
/// The image is resized (aspect preserved) when its larger dimension exceeds
/// `max_width_or_height`. PNG input stays PNG; other formats re-encode as JPEG,
/// stepping quality down until the output fits `max_size_mb` or the quality
/// floor is reached. When re-encoding does not actually shrink the file, the
/// original blob is returned unchanged.
///
/// CPU-bound; callers run this under `spawn_blocking`.
pub fn compress_image(blob: &FileBlob, config: &ImageCompressionConfig) -> Result<FileBlob> {
    let img = image::load_from_memory(&blob.bytes)
        .map_err(|e| UploadError::Compression(format!("Failed to decode {:?}: {}", blob.name, e)))?;

    let max_dim = config.max_width_or_height;
    let img = if img.width().max(img.height()) > max_dim {
        debug!(
            file = %blob.name,
            width = img.width(),
            height = img.height(),
            max_dim,
            "resizing image"
        );
        img.resize(max_dim, max_dim, FilterType::Triangle)
    } else {
        img
    };

    let max_bytes = (config.max_size_mb * 1024.0 * 1024.0) as usize;

    let (encoded, name, content_type) = if blob.content_type == "image/png" {
        (encode_png(&img)?, blob.name.clone(), "image/png".to_string())
    } else {
        let mut quality = INITIAL_JPEG_QUALITY;
        let mut encoded = encode_jpeg(&img, quality)?;
        while encoded.len() > max_bytes && quality > MIN_JPEG_QUALITY {
            quality = quality.saturating_sub(10).max(MIN_JPEG_QUALITY);
            encoded = encode_jpeg(&img, quality)?;
        }
        (encoded, jpeg_name(&blob.name), "image/jpeg".to_string())
    };

    // Re-encoding small or already-optimized files can grow them; keep the
    // original in that case.
    if encoded.len() as u64 >= blob.size() {
        debug!(file = %blob.name, "compression did not shrink file, keeping original");
        return Ok(blob.clone());
    }

    debug!(
        file = %blob.name,
        original = blob.size(),
        compressed = encoded.len(),
        "image compressed"
    );

    Ok(FileBlob {
        name,
        content_type,
        last_modified: blob.last_modified,
        bytes: Bytes::from(encoded),
    })
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel; flatten first.
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| UploadError::Compression(format!("JPEG encoding failed: {}", e)))?;
    Ok(out)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    img.write_with_encoder(PngEncoder::new(&mut out))
        .map_err(|e| UploadError::Compression(format!("PNG encoding failed: {}", e)))?;
    Ok(out)
}

/// Replace the file extension with `.jpg` for blobs re-encoded as JPEG
fn jpeg_name(name: &str) -> String {
    Path::new(name)
        .with_extension("jpg")
        .to_string_lossy()
        .into_owned()
}
