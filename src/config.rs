use std::time::Duration;

use once_cell::sync::Lazy;

use crate::error::{GalleryError, Result};

/// Environment variable holding the styling border width (in px).
pub const IMAGE_BORDER_ENV: &str = "ROWGALLERY_IMAGE_BORDER";

/// Border width picked up from the environment once per process.
static ENV_IMAGE_BORDER: Lazy<u32> = Lazy::new(|| {
    std::env::var(IMAGE_BORDER_ENV)
        .ok()
        .and_then(|v| v.trim().trim_end_matches("px").parse::<u32>().ok())
        .unwrap_or(0)
});

/// Constructor-time options for a gallery session.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    /// Border drawn around each image, subtracted from both sides of the inner box.
    pub image_border_px: u32,
    /// Nominal row height before per-row justification (default: 90)
    pub target_row_height_px: u32,
    /// Trailing debounce applied to layout requests (default: 100ms)
    pub layout_debounce_ms: u64,
    /// Whether images can be checked (default: true)
    pub selectable: bool,
    /// Whether a click opens the lightbox (default: true)
    pub lightbox_enabled: bool,
    /// Auto-tune offset wraps within `[-range, +range]` (default: 5)
    pub offset_range: i32,
    /// Retries after the first pass before giving up (default: `2 * offset_range`)
    pub max_tune_retries: u32,
    /// Edge of the square substituted for images with unknown dimensions.
    pub fallback_size_px: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            image_border_px: *ENV_IMAGE_BORDER,
            target_row_height_px: 90,
            layout_debounce_ms: 100,
            selectable: true,
            lightbox_enabled: true,
            offset_range: 5,
            max_tune_retries: 10,
            fallback_size_px: 90,
        }
    }
}

impl GalleryConfig {
    pub fn with_image_border(mut self, px: u32) -> Self {
        self.image_border_px = px;
        self
    }

    /// Sets the target row height; the fallback square follows it.
    pub fn with_row_height(mut self, px: u32) -> Self {
        self.target_row_height_px = px;
        self.fallback_size_px = px;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.layout_debounce_ms = ms;
        self
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn with_lightbox(mut self, enabled: bool) -> Self {
        self.lightbox_enabled = enabled;
        self
    }

    /// Sets the auto-tune range; the retry cap follows it.
    pub fn with_offset_range(mut self, range: i32) -> Self {
        self.offset_range = range;
        self.max_tune_retries = range.max(0) as u32 * 2;
        self
    }

    pub fn layout_debounce(&self) -> Duration {
        Duration::from_millis(self.layout_debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_row_height_px == 0 {
            return Err(GalleryError::InvalidConfig(
                "target row height must be positive".into(),
            ));
        }
        if self.offset_range <= 0 {
            return Err(GalleryError::InvalidConfig(format!(
                "offset range must be positive, got {}",
                self.offset_range
            )));
        }
        if self.fallback_size_px == 0 {
            return Err(GalleryError::InvalidConfig(
                "fallback image size must be positive".into(),
            ));
        }
        Ok(())
    }
}
