//! HTTP PUT transfer with progress reporting and cancellation

use super::types::FileBlob;
use crate::utils::error::{Result, UploadError};
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Size of the body chunks fed to the HTTP client. Progress is reported once
/// per chunk, as the client pulls it into its send buffer.
const CHUNK_SIZE: usize = 64 * 1024;

/// Upload `blob` to `url` via HTTP PUT.
///
/// The body is streamed in fixed-size chunks; `on_progress` receives the
/// fraction of bytes handed to the client so far. Cancelling `token` aborts the
/// request and yields [`UploadError::Cancelled`]. Non-2xx responses become
/// [`UploadError::Status`].
pub async fn put_with_progress<F>(
    client: &Client,
    url: &str,
    blob: FileBlob,
    token: CancellationToken,
    on_progress: F,
) -> Result<()>
where
    F: Fn(f64) + Send + Sync + 'static,
{
    let total = blob.size();
    debug!(url, size = total, content_type = %blob.content_type, "starting PUT");

    let chunks = chunk_with_progress(blob.bytes);
    let stream = futures::stream::iter(chunks.into_iter().map(move |(chunk, progress)| {
        on_progress(progress);
        Ok::<Bytes, std::io::Error>(chunk)
    }));

    let request = client
        .put(url)
        .header(CONTENT_TYPE, blob.content_type.clone())
        .header(CONTENT_LENGTH, total)
        .body(reqwest::Body::wrap_stream(stream));

    let response = tokio::select! {
        _ = token.cancelled() => return Err(UploadError::Cancelled),
        result = request.send() => result?,
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UploadError::Status {
            status: status.as_u16(),
            body,
        });
    }

    debug!(url, "PUT completed");
    Ok(())
}

/// Split `bytes` into transfer chunks, pairing each with the cumulative
/// progress fraction reached once that chunk has been handed off.
fn chunk_with_progress(bytes: Bytes) -> Vec<(Bytes, f64)> {
    let total = bytes.len() as u64;
    let mut remaining = bytes;
    let mut sent: u64 = 0;
    let mut chunks = Vec::new();

    while !remaining.is_empty() {
        let take = remaining.len().min(CHUNK_SIZE);
        let chunk = remaining.split_to(take);
        sent += take as u64;
        chunks.push((chunk, sent as f64 / total as f64));
    }

    chunks
}
