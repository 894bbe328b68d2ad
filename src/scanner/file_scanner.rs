//! Directory scanner producing gallery entries.
//!
//! Walks a directory, keeps files with an image extension and returns them in
//! path order as pending entries. Ids are paths relative to the scan root so
//! they stay stable across machines.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::ImageEntry;

/// Extensions the gallery can size.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif"];

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to scan directories recursively.
    pub recursive: bool,
    /// Maximum directory depth (0 = unlimited).
    pub max_depth: usize,
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 0, // unlimited
            follow_symlinks: false,
        }
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Finds image files under `dir`, sorted by path.
pub fn discover_images(dir: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {:?}", dir);
    }

    let mut walker = WalkDir::new(dir).follow_links(config.follow_symlinks);
    if !config.recursive {
        walker = walker.max_depth(1);
    } else if config.max_depth > 0 {
        walker = walker.max_depth(config.max_depth);
    }

    let mut paths = Vec::new();
    for entry in walker.into_iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_dir() || !is_image_path(entry.path()) {
            continue;
        }
        paths.push(entry.into_path());
    }

    paths.sort();
    debug!("Discovered {} images in {:?}", paths.len(), dir);
    Ok(paths)
}

/// Scans `dir` into pending gallery entries (natural sizes unknown).
pub fn scan_entries(dir: &Path, config: &ScanConfig) -> Result<Vec<ImageEntry>> {
    let paths = discover_images(dir, config)?;
    let entries = paths
        .into_iter()
        .map(|path| {
            let id = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            ImageEntry::pending(id, path.to_string_lossy().into_owned())
        })
        .collect::<Vec<_>>();
    info!("Scanned {} images from {:?}", entries.len(), dir);
    Ok(entries)
}

/// Runs `scan_entries` on the blocking pool.
pub async fn scan(dir: &Path, config: ScanConfig) -> Result<Vec<ImageEntry>> {
    let dir = dir.to_path_buf();
    task::spawn_blocking(move || scan_entries(&dir, &config))
        .await
        .context("Scan task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn create_test_image(path: &Path) {
        // Minimal valid PNG file (1x1 pixel)
        let png_data: [u8; 67] = [
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
            0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 dimensions
            0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53,
            0xDE, // bit depth, color type, etc
            0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, // IDAT chunk
            0x08, 0xD7, 0x63, 0xF8, 0x0F, 0x00, 0x00, 0x01, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0xB4,
            0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, // IEND chunk
            0xAE, 0x42, 0x60, 0x82,
        ];

        let mut file = File::create(path).unwrap();
        file.write_all(&png_data).unwrap();
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("a/b.JPG")));
        assert!(is_image_path(Path::new("c.webp")));
        assert!(!is_image_path(Path::new("clip.mp4")));
        assert!(!is_image_path(Path::new("README")));
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempdir().unwrap();
        let paths = discover_images(dir.path(), &ScanConfig::default()).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_discover_rejects_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("x.png");
        create_test_image(&file);
        assert!(discover_images(&file, &ScanConfig::default()).is_err());
    }

    #[test]
    fn test_scan_entries_sorted_and_relative() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("b.png"));
        create_test_image(&dir.path().join("a.png"));
        File::create(dir.path().join("notes.txt")).unwrap();

        let entries = scan_entries(dir.path(), &ScanConfig::default()).unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a.png", "b.png"]);
        assert!(entries.iter().all(|e| !e.loaded));
        assert!(entries[0].source_path.ends_with("a.png"));
    }

    #[test]
    fn test_scan_recursive_vs_flat() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("trip");
        fs::create_dir(&nested).unwrap();
        create_test_image(&dir.path().join("top.png"));
        create_test_image(&nested.join("inner.png"));

        let all = scan_entries(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(all.len(), 2);

        let flat = ScanConfig {
            recursive: false,
            ..ScanConfig::default()
        };
        let top = scan_entries(dir.path(), &flat).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id.as_str(), "top.png");
    }

    #[tokio::test]
    async fn test_async_scan() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("one.png"));
        let entries = scan(dir.path(), ScanConfig::default()).await.unwrap();
        assert_eq!(entries.len(), 1);
    }
}
