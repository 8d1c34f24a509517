//! Compression behavior observed through the wire

use crate::common::fixtures::wait_until;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::time::Duration;
use uploader_rs::{BatchUploader, FileBlob, UploadItem, UploaderConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Deterministic noisy JPEG; noise keeps the encoder from compressing it away.
fn noise_jpeg_blob(width: u32, height: u32) -> FileBlob {
    let mut seed: u32 = 0x1234_5678;
    let img = RgbImage::from_fn(width, height, |_, _| {
        seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
        image::Rgb([(seed >> 8) as u8, (seed >> 16) as u8, (seed >> 24) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    FileBlob::new("photo.jpeg", "image/jpeg", 1_700_000_000_000, out.into_inner())
}

#[tokio::test]
async fn test_image_is_compressed_before_upload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/img"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let blob = noise_jpeg_blob(2400, 1600);
    let original_size = blob.size();

    let uploader = BatchUploader::new(UploaderConfig::default()).unwrap();
    uploader.submit(vec![UploadItem::new(
        blob,
        Some(format!("{}/img", server.uri())),
    )]);

    assert!(wait_until(|| uploader.is_all_uploaded(), Duration::from_secs(30)).await);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!((requests[0].body.len() as u64) < original_size);
    let content_type = requests[0].headers.get("content-type").unwrap();
    assert_eq!(content_type.to_str().unwrap(), "image/jpeg");

    let received = image::load_from_memory(&requests[0].body).unwrap();
    assert!(received.width() <= 1920);
    assert!(received.height() <= 1920);
}

#[tokio::test]
async fn test_disabled_compression_uploads_original_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/img"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let blob = noise_jpeg_blob(640, 480);
    let original = blob.bytes.clone();

    let mut config = UploaderConfig::default();
    config.image_compression.is_enabled = false;

    let uploader = BatchUploader::new(config).unwrap();
    uploader.submit(vec![UploadItem::new(
        blob,
        Some(format!("{}/img", server.uri())),
    )]);

    assert!(wait_until(|| uploader.is_all_uploaded(), Duration::from_secs(10)).await);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, original.to_vec());
}

#[tokio::test]
async fn test_undecodable_image_falls_back_to_original() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/img"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // Claims to be an image but is not decodable; compression fails and the
    // original bytes are uploaded anyway.
    let blob = FileBlob::new("broken.png", "image/png", 0, vec![0xAAu8; 256]);

    let uploader = BatchUploader::new(UploaderConfig::default()).unwrap();
    uploader.submit(vec![UploadItem::new(
        blob,
        Some(format!("{}/img", server.uri())),
    )]);

    assert!(wait_until(|| uploader.is_all_uploaded(), Duration::from_secs(10)).await);
    assert!(!uploader.is_any_error());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body.len(), 256);
}
