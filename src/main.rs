//! uploader - batch file upload CLI
//!
//! Reads a YAML manifest of file/URL pairs and uploads everything in one
//! batch, polling progress until every item has settled.

use anyhow::{Context, bail};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use uploader_rs::{BatchUploader, FileBlob, UploadItem, UploaderConfig};

#[derive(Parser)]
#[command(name = "uploader", version, about = "Upload a batch of files to pre-signed URLs")]
struct Args {
    /// Path to the upload manifest (YAML list of `{path, url, content_type?}`)
    #[arg(long)]
    manifest: PathBuf,

    /// Optional uploader configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable image compression for this run
    #[arg(long)]
    no_compression: bool,

    /// Write a JSON report of per-item results to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Progress polling interval in milliseconds
    #[arg(long, default_value_t = 200)]
    poll_interval_ms: u64,
}

/// One manifest line; `url` is required here even though the library allows
/// URL-less items, because a CLI run has no later chance to supply one.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    path: PathBuf,
    url: String,
    content_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    name: String,
    uploaded: bool,
    progress: f64,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    uploader_rs::utils::logging::init("info");

    match run(Args::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let mut config = match &args.config {
        Some(path) => UploaderConfig::from_file(path).await?,
        None => UploaderConfig::default(),
    };
    if args.no_compression {
        config.image_compression.is_enabled = false;
    }

    let manifest = tokio::fs::read_to_string(&args.manifest)
        .await
        .with_context(|| format!("Failed to read manifest {:?}", args.manifest))?;
    let entries: Vec<ManifestEntry> =
        serde_yaml::from_str(&manifest).context("Failed to parse manifest")?;
    if entries.is_empty() {
        bail!("Manifest contains no entries");
    }

    let mut items = Vec::with_capacity(entries.len());
    for entry in &entries {
        let mut file = FileBlob::from_path(&entry.path)
            .await
            .with_context(|| format!("Failed to load {:?}", entry.path))?;
        if let Some(content_type) = &entry.content_type {
            file.content_type = content_type.clone();
        }
        items.push(UploadItem::new(file, Some(entry.url.clone())));
    }

    info!(count = items.len(), "starting batch upload");
    let uploader = BatchUploader::new(config)?;
    uploader.submit(items);

    loop {
        tokio::time::sleep(Duration::from_millis(args.poll_interval_ms)).await;
        let summary = uploader.summary();
        info!("progress: {:.0}%", summary.total_progress * 100.0);
        if uploader.states().iter().all(|s| s.is_settled()) {
            break;
        }
    }

    let states = uploader.states();
    let report: Vec<ReportEntry> = entries
        .iter()
        .zip(&states)
        .map(|(entry, state)| ReportEntry {
            name: entry
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            uploaded: state.is_uploaded,
            progress: state.progress,
            error: state.error.as_ref().map(|e| e.to_string()),
        })
        .collect();

    if let Some(path) = &args.report {
        tokio::fs::write(path, serde_json::to_vec_pretty(&report)?)
            .await
            .with_context(|| format!("Failed to write report {:?}", path))?;
    }

    let failed = report.iter().filter(|r| r.error.is_some()).count();
    if failed == 0 {
        info!("all {} files uploaded", report.len());
        Ok(true)
    } else {
        for entry in report.iter().filter(|r| r.error.is_some()) {
            error!(
                file = %entry.name,
                error = entry.error.as_deref().unwrap_or(""),
                "upload failed"
            );
        }
        Ok(false)
    }
}
