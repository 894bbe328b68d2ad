//! Settles pending images by reading their natural size from disk.
//!
//! - Header-only reads on the blocking pool, bounded by a semaphore
//! - Results come back over a flume channel in completion order
//! - A read failure settles the image as failed instead of aborting the batch

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::ImageReader;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::gallery::Gallery;
use crate::models::{Dimensions, ImageId, SettleOutcome};
use crate::ui::Presenter;

/// Default number of concurrent reads.
pub const DEFAULT_WORKERS: usize = 4;

/// Maximum number of concurrent reads.
const MAX_WORKERS: usize = 16;

/// Counts from one settle run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub loaded: usize,
    pub failed: usize,
}

impl SettleReport {
    pub fn total(&self) -> usize {
        self.loaded + self.failed
    }
}

/// Reads an image's natural size without decoding the pixels.
pub fn read_dimensions(path: &Path) -> Result<Dimensions> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("Failed to open image: {:?}", path))?
        .with_guessed_format()
        .context("Failed to guess image format")?;
    let (width, height) = reader
        .into_dimensions()
        .with_context(|| format!("Failed to read dimensions: {:?}", path))?;
    Ok(Dimensions::new(width, height))
}

fn settle_one(path: &Path) -> SettleOutcome {
    match read_dimensions(path) {
        Ok(dims) if !dims.is_empty() => SettleOutcome::Loaded(dims),
        Ok(_) => {
            warn!(?path, "Image reports zero size");
            SettleOutcome::Failed
        }
        Err(e) => {
            warn!(?path, error = %e, "Image failed to load");
            SettleOutcome::Failed
        }
    }
}

/// Settles every pending image in the gallery.
///
/// `resolve` maps an image's source path to a file on disk. The last image to
/// settle schedules the gallery's layout.
pub async fn settle_pending<P, F>(
    gallery: &Gallery<P>,
    workers: usize,
    resolve: F,
) -> Result<SettleReport>
where
    P: Presenter + Send + 'static,
    F: Fn(&str) -> PathBuf,
{
    let pending = gallery.lock().registry().pending();
    if pending.is_empty() {
        return Ok(SettleReport::default());
    }

    let workers = workers.clamp(1, MAX_WORKERS);
    debug!(count = pending.len(), workers, "Reading image dimensions");

    let permits = Arc::new(Semaphore::new(workers));
    let (tx, rx) = flume::unbounded::<(ImageId, SettleOutcome)>();
    for (id, source) in pending {
        let path = resolve(&source);
        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .context("Dimension reader pool closed")?;
        let tx = tx.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = settle_one(&path);
            drop(permit);
            // Receiver only goes away if the caller stopped waiting
            let _ = tx.send((id, outcome));
        });
    }
    drop(tx);

    let mut report = SettleReport::default();
    while let Ok((id, outcome)) = rx.recv_async().await {
        match outcome {
            SettleOutcome::Loaded(_) => report.loaded += 1,
            SettleOutcome::Failed => report.failed += 1,
        }
        gallery
            .record_settled(id.as_str(), outcome)
            .with_context(|| format!("Failed to settle image {id}"))?;
    }

    info!(
        loaded = report.loaded,
        failed = report.failed,
        "Image dimensions settled"
    );
    Ok(report)
}
