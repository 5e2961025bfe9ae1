//! Command-line front end for the medialift uploader.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use medialift_protocol::{EventKind, SourceFile, UploadEvent};
use medialift_uploader::{UploadTarget, Uploader, UploaderOptions};
use tracing::debug;

/// Batch-uploads media files to an object-storage endpoint.
#[derive(Debug, Parser)]
#[command(name = "medialift", version, about)]
struct Args {
    /// Files to upload.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Direct upload URL.
    #[arg(long, conflicts_with = "credentials_endpoint")]
    upload_url: Option<String>,

    /// Credentials endpoint for signed-form uploads.
    #[arg(long)]
    credentials_endpoint: Option<String>,

    /// Object-key prefix for direct uploads.
    #[arg(long)]
    prefix: Option<String>,

    /// Maximum concurrent transfers (default: platform parallelism).
    #[arg(long)]
    concurrency: Option<usize>,

    /// Maximum image width before resizing.
    #[arg(long)]
    max_width: Option<u32>,

    /// Maximum image height before resizing.
    #[arg(long)]
    max_height: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let target = match (&args.credentials_endpoint, &args.upload_url) {
        (Some(endpoint), _) => UploadTarget::SignedForm {
            credentials_endpoint: endpoint.clone(),
        },
        (None, Some(url)) => UploadTarget::Direct {
            upload_url: url.clone(),
            prefix: args.prefix.clone(),
        },
        (None, None) => bail!("either --upload-url or --credentials-endpoint is required"),
    };

    let mut options = UploaderOptions::new(target);
    options.concurrency = args.concurrency;
    if let Some(width) = args.max_width {
        options.max_width = width;
    }
    if let Some(height) = args.max_height {
        options.max_height = height;
    }

    let mut uploader = Uploader::init(options)
        .await
        .context("initializing upload session")?;

    for path in &args.files {
        let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime = detect_content_type(&name)
            .unwrap_or("application/octet-stream")
            .to_string();
        debug!(name = %name, mime = %mime, bytes = data.len(), "queued");
        uploader.add_file(SourceFile::new(name, mime, data));
    }

    uploader.subscribe(EventKind::Skipped, |event| {
        if let UploadEvent::Skipped(skipped) = event {
            println!("skip  {} ({} bytes): {}", skipped.name, skipped.size, skipped.message);
        }
    });
    uploader.subscribe(EventKind::Progress, |event| {
        if let UploadEvent::Progress {
            percent, uploaded, total_files,
        } = event
        {
            println!("  ... {percent:>3}% ({uploaded}/{total_files} done)");
        }
    });
    uploader.subscribe(EventKind::Uploaded, |event| {
        if let UploadEvent::Uploaded(uploaded) = event {
            println!("ok    {} ({} bytes)", uploaded.location, uploaded.size);
        }
    });
    uploader.subscribe(EventKind::Failed, |event| {
        if let UploadEvent::Failed(failed) = event {
            eprintln!("fail  {}: {}", failed.name, failed.message);
        }
    });

    let summary = uploader.start().await;
    println!(
        "done: {} uploaded, {} skipped, {} failed ({} bytes)",
        summary.uploaded,
        summary.skipped.len(),
        summary.failed.len(),
        summary.total_bytes
    );

    Ok(if summary.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Guesses a MIME type from the file extension.
fn detect_content_type(name: &str) -> Option<&'static str> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("heic") => Some("image/heic"),
        Some("mp4") => Some("video/mp4"),
        Some("mov") => Some("video/quicktime"),
        Some("webm") => Some("video/webm"),
        Some("mkv") => Some("video/x-matroska"),
        _ => None,
    }
}
