//! Justified-row photo gallery engine.
//!
//! Images are packed into rows of equal height that fill the container width
//! exactly, re-laid out on resize once every image's natural size is known.
//! Selection and a lightbox navigator sit on the same ordered image registry.

pub mod config;
pub mod error;
pub mod gallery;
pub mod layout;
pub mod loader;
pub mod models;
pub mod scanner;
pub mod source;
pub mod ui;

pub use config::GalleryConfig;
pub use error::{GalleryError, Result};
pub use gallery::{Gallery, GallerySession};
pub use layout::LayoutOutcome;
pub use models::{Dimensions, ImageEntry, ImageId, SettleOutcome};
pub use ui::{HeadlessSurface, Presenter};
