//! Test fixtures and polling helpers

use std::time::{Duration, Instant};
use uploader_rs::{FileBlob, UploadItem};

/// A small text blob with fixed metadata
pub fn text_blob(name: &str, payload: &[u8]) -> FileBlob {
    FileBlob::new(name, "text/plain", 1_700_000_000_000, payload.to_vec())
}

/// A text upload item pointed at `url`
pub fn text_item(name: &str, url: Option<String>) -> UploadItem {
    UploadItem::new(text_blob(name, b"integration payload"), url)
}

/// Poll `condition` every 20ms until it holds or `timeout` elapses
pub async fn wait_until<F>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
