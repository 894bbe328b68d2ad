use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use rowgallery::loader::{self, DEFAULT_WORKERS};
use rowgallery::scanner::{self, ScanConfig};
use rowgallery::{source, Gallery, GalleryConfig, GallerySession, HeadlessSurface, ImageEntry};

/// Lays out a directory of images in justified rows and prints the result.
#[derive(Parser, Debug)]
#[command(name = "rowgallery", version, about = "Justified-row gallery layout")]
struct Args {
    /// Directory holding the images
    dir: PathBuf,

    /// Saved metadata response (JSON array); previews resolve against `dir`
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Container width in pixels
    #[arg(short, long, default_value_t = 1200)]
    width: u32,

    /// Visible container height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Width taken by the vertical scrollbar once content overflows
    #[arg(long, default_value_t = 0)]
    scrollbar: u32,

    /// Target row height in pixels
    #[arg(short = 'r', long, default_value_t = 90)]
    row_height: u32,

    /// Border around each image in pixels (defaults to ROWGALLERY_IMAGE_BORDER)
    #[arg(short, long)]
    border: Option<u32>,

    /// Only scan the top level of `dir`
    #[arg(long)]
    flat: bool,

    /// Concurrent dimension reads
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,
}

fn gallery_config(args: &Args) -> GalleryConfig {
    let config = GalleryConfig::default().with_row_height(args.row_height);
    match args.border {
        Some(px) => config.with_image_border(px),
        None => config,
    }
}

async fn collect_entries(args: &Args) -> Result<Vec<ImageEntry>> {
    match &args.metadata {
        Some(path) => {
            let records = source::load_records(path)?;
            info!("Loaded {} metadata records", records.len());
            Ok(records.iter().map(source::SourceRecord::to_entry).collect())
        }
        None => {
            let config = ScanConfig {
                recursive: !args.flat,
                ..ScanConfig::default()
            };
            scanner::scan(&args.dir, config).await
        }
    }
}

fn resolve(root: &Path, source_path: &str) -> PathBuf {
    let path = Path::new(source_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rowgallery=info".parse().context("Invalid log directive")?),
        )
        .init();

    let args = Args::parse();
    let config = gallery_config(&args);
    config.validate()?;

    let entries = collect_entries(&args).await?;
    let surface = HeadlessSurface::new(args.width, args.height).with_scrollbar(args.scrollbar);
    let session = GallerySession::try_new("gallery", Some(surface), entries, config)?;
    let gallery = Gallery::new(session);

    let root = args.dir.clone();
    loader::settle_pending(&gallery, args.workers, |source| resolve(&root, source)).await?;

    let outcome = gallery.flush_layout();
    let session = gallery.lock();
    info!(
        ?outcome,
        images = session.image_count(),
        failed = session.failed_count(),
        "Layout complete"
    );

    for row in session.rows() {
        let items: Vec<String> = row
            .items
            .iter()
            .map(|item| format!("{}:{}", item.id, item.width))
            .collect();
        println!(
            "row {:>3}  h={:<4} w={:<5} {}",
            row.row_index,
            row.height_px,
            row.width(),
            items.join(" ")
        );
    }
    println!(
        "{} rows, {}px tall, offset {}",
        session.rows().len(),
        session.layout_height(),
        session.offset()
    );
    Ok(())
}
