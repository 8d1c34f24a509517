//! Batch upload orchestrator
//!
//! Tracks per-item upload state keyed by content signature, diffs successive
//! submissions so unchanged items are never restarted, and exposes retry and
//! cancellation controls plus aggregate progress.

use super::compression::compress_image;
use super::transfer::put_with_progress;
use super::types::{BatchSummary, Signature, UploadItem, UploadState};
use crate::config::UploaderConfig;
use crate::utils::error::{Result, UploadError};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// An in-flight request handle for one signature.
///
/// The attempt id distinguishes successive requests for the same signature, so
/// a finished attempt only removes its own token from the map.
struct ActiveRequest {
    attempt: u64,
    token: CancellationToken,
}

/// Shared orchestrator state, mutated only from within upload tasks and the
/// synchronous control methods.
struct BatchInner {
    client: reqwest::Client,
    config: UploaderConfig,
    /// Per-signature upload state; entries exist only for observed signatures
    states: RwLock<HashMap<Signature, UploadState>>,
    /// Cancellation tokens for in-flight requests
    active: Mutex<HashMap<Signature, ActiveRequest>>,
    /// Signatures that already have an upload task, used for submit diffing
    handled: Mutex<HashSet<Signature>>,
    /// Current batch items, in submission order
    items: RwLock<Vec<UploadItem>>,
    /// Batch generation; bumped when the batch is cleared. Tasks capture the
    /// generation they were spawned under and discard their effects when it
    /// has moved on.
    generation: AtomicU64,
    /// Monotonic attempt counter for [`ActiveRequest`]
    attempt_seq: AtomicU64,
}

/// Uploads batches of files to pre-signed URLs with per-item progress,
/// retry and cancellation.
///
/// All items of a batch upload concurrently; failures and cancellations are
/// scoped to the item that produced them.
#[derive(Clone)]
pub struct BatchUploader {
    inner: Arc<BatchInner>,
}

impl BatchUploader {
    /// Create an uploader with its own HTTP client built from `config`
    pub fn new(config: UploaderConfig) -> Result<Self> {
        config.validate()?;
        let client = config.build_client()?;
        Ok(Self::with_client(client, config))
    }

    /// Create an uploader reusing an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: UploaderConfig) -> Self {
        Self {
            inner: Arc::new(BatchInner {
                client,
                config,
                states: RwLock::new(HashMap::new()),
                active: Mutex::new(HashMap::new()),
                handled: Mutex::new(HashSet::new()),
                items: RwLock::new(Vec::new()),
                generation: AtomicU64::new(0),
                attempt_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Submit the current batch.
    ///
    /// The list is diffed by signature against the previous submission:
    /// removed items have their in-flight request cancelled and their state
    /// dropped, new items start uploading, unchanged items are left alone. An
    /// identical re-submission therefore performs zero network activity.
    ///
    /// An empty list clears the batch: every in-flight request is cancelled
    /// and the batch generation is bumped so that stale callbacks from the
    /// superseded batch cannot touch state recorded afterwards.
    pub fn submit(&self, items: Vec<UploadItem>) {
        if items.is_empty() {
            self.clear();
            return;
        }

        let generation = self.inner.generation.load(Ordering::SeqCst);
        let current: HashSet<Signature> = items.iter().map(|i| i.signature()).collect();

        // Cancel and forget items that are no longer present.
        let removed: Vec<Signature> = {
            let handled = self.inner.handled.lock();
            handled.difference(&current).cloned().collect()
        };
        if !removed.is_empty() {
            debug!(count = removed.len(), "removing items no longer in batch");
            let mut active = self.inner.active.lock();
            let mut handled = self.inner.handled.lock();
            let mut states = self.inner.states.write();
            for sig in &removed {
                if let Some(request) = active.remove(sig) {
                    request.token.cancel();
                }
                handled.remove(sig);
                states.remove(sig);
            }
        }

        *self.inner.items.write() = items.clone();

        // Start uploads for signatures we have not handled yet.
        for item in items {
            let sig = item.signature();
            let is_new = self.inner.handled.lock().insert(sig);
            if is_new {
                self.spawn_upload(item, generation);
            }
        }
    }

    /// Re-attempt one item (by position in the current batch) or all items
    pub fn retry(&self, index: Option<usize>) {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        match index {
            Some(i) => {
                let item = self.inner.items.read().get(i).cloned();
                if let Some(item) = item {
                    self.spawn_upload(item, generation);
                }
            }
            None => {
                let items = self.inner.items.read().clone();
                for item in items {
                    self.spawn_upload(item, generation);
                }
            }
        }
    }

    /// Cancel the in-flight request for one item or for all items.
    ///
    /// Recorded progress and errors are kept; cancellation is never surfaced
    /// as a per-item error.
    pub fn cancel(&self, index: Option<usize>) {
        match index {
            Some(i) => {
                let sig = self.inner.items.read().get(i).map(|item| item.signature());
                if let Some(sig) = sig {
                    if let Some(request) = self.inner.active.lock().get(&sig) {
                        request.token.cancel();
                    }
                }
            }
            None => {
                for request in self.inner.active.lock().values() {
                    request.token.cancel();
                }
            }
        }
    }

    /// Per-item states, ordered like the current batch. Items whose upload
    /// task has not recorded anything yet appear in the pending state.
    pub fn states(&self) -> Vec<UploadState> {
        let items = self.inner.items.read();
        let states = self.inner.states.read();
        items
            .iter()
            .map(|item| {
                states
                    .get(&item.signature())
                    .cloned()
                    .unwrap_or_else(UploadState::pending)
            })
            .collect()
    }

    /// Aggregate view over the current batch
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_states(&self.states())
    }

    /// Arithmetic mean of per-item progress; `0` for an empty batch
    pub fn total_progress(&self) -> f64 {
        self.summary().total_progress
    }

    /// True iff the batch is non-empty and every item finished uploading
    pub fn is_all_uploaded(&self) -> bool {
        self.summary().is_all_uploaded
    }

    /// True iff any item recorded an error
    pub fn is_any_error(&self) -> bool {
        self.summary().is_any_error
    }

    /// True iff any item is still preparing
    pub fn is_preparing_any(&self) -> bool {
        self.summary().is_preparing_any
    }

    /// Cancel everything and forget all bookkeeping
    fn clear(&self) {
        debug!("clearing batch");
        {
            let mut active = self.inner.active.lock();
            for request in active.values() {
                request.token.cancel();
            }
            active.clear();
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.states.write().clear();
        self.inner.handled.lock().clear();
        self.inner.items.write().clear();
    }

    fn spawn_upload(&self, item: UploadItem, generation: u64) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            upload_one(inner, item, generation).await;
        });
    }
}

impl BatchInner {
    /// Apply a state mutation for `sig`, unless the signature has been removed
    /// from the batch meanwhile (a late completion must not resurrect it).
    fn update_state<F: FnOnce(&mut UploadState)>(&self, sig: &Signature, apply: F) {
        if !self.handled.lock().contains(sig) {
            return;
        }
        let mut states = self.states.write();
        let state = states.entry(sig.clone()).or_insert_with(UploadState::pending);
        apply(state);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Upload a single item: reset its state, optionally compress, then PUT with
/// progress. Every state mutation is gated on the captured batch generation so
/// a superseded batch cannot corrupt newer state.
async fn upload_one(inner: Arc<BatchInner>, item: UploadItem, generation: u64) {
    let sig = item.signature();
    inner.handled.lock().insert(sig.clone());
    if !inner.is_current(generation) {
        return;
    }

    inner.update_state(&sig, |state| {
        state.progress = 0.0;
        state.is_uploaded = false;
        state.error = None;
        state.is_preparing = true;
    });

    // A retry supersedes any still-running request for this signature.
    if let Some(request) = inner.active.lock().get(&sig) {
        request.token.cancel();
    }

    // No destination yet: the item stays in the preparing state until a later
    // submission provides a URL.
    let Some(url) = item.url.clone() else {
        return;
    };

    let token = CancellationToken::new();
    let attempt = inner.attempt_seq.fetch_add(1, Ordering::SeqCst);
    inner.active.lock().insert(
        sig.clone(),
        ActiveRequest {
            attempt,
            token: token.clone(),
        },
    );
    if !inner.is_current(generation) {
        release_request(&inner, &sig, attempt);
        return;
    }

    let mut blob = item.file.clone();

    let compression = inner.config.image_compression.clone();
    if compression.is_enabled && blob.is_image() {
        let input = blob.clone();
        let compressed =
            tokio::task::spawn_blocking(move || compress_image(&input, &compression)).await;
        match compressed {
            Ok(Ok(compressed)) => blob = compressed,
            Ok(Err(e)) => {
                warn!(file = %item.file.name, error = %e, "image compression failed, uploading original file");
            }
            Err(e) => {
                warn!(file = %item.file.name, error = %e, "compression task failed, uploading original file");
            }
        }
        // Compression always runs to completion, but its result is discarded
        // when the batch has been superseded meanwhile.
        if !inner.is_current(generation) {
            release_request(&inner, &sig, attempt);
            return;
        }
    }

    inner.update_state(&sig, |state| state.is_preparing = false);

    let progress_inner = inner.clone();
    let progress_sig = sig.clone();
    let result = put_with_progress(&inner.client, &url, blob, token, move |progress| {
        if progress_inner.is_current(generation) {
            progress_inner.update_state(&progress_sig, |state| state.progress = progress);
        }
    })
    .await;

    if inner.is_current(generation) {
        match result {
            Ok(()) => {
                inner.update_state(&sig, |state| {
                    state.is_uploaded = true;
                    state.progress = 1.0;
                });
            }
            Err(UploadError::Cancelled) => {
                debug!(%url, "upload cancelled");
            }
            Err(e) => {
                warn!(%url, error = %e, "upload failed");
                inner.update_state(&sig, |state| {
                    state.error = Some(Arc::new(e));
                    state.is_preparing = false;
                });
            }
        }
    }

    release_request(&inner, &sig, attempt);
}

/// Remove this attempt's cancel token, leaving any newer attempt's token alone
fn release_request(inner: &Arc<BatchInner>, sig: &Signature, attempt: u64) {
    let mut active = inner.active.lock();
    if active.get(sig).is_some_and(|r| r.attempt == attempt) {
        active.remove(sig);
    }
}
