pub mod file_scanner;

pub use file_scanner::{discover_images, is_image_path, scan, scan_entries, ScanConfig};
