use crate::models::ImageId;

/// One image as placed by a layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct JustifiedImage {
    pub id: ImageId,
    pub height: u32,
    pub width: u32,
    /// `height / width` of the natural image.
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRow {
    pub row_index: u32,
    pub height_px: u32,
    pub items: Vec<JustifiedImage>,
}

impl LayoutRow {
    pub fn new(row_index: u32, height_px: u32, items: Vec<JustifiedImage>) -> Self {
        Self {
            row_index,
            height_px,
            items,
        }
    }

    pub fn width(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.width))
    }
}

/// Geometry handed to the presentation layer for one image.
///
/// The outer box is the row slot; the inner size is the image itself once the
/// border has been taken off both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub id: ImageId,
    pub row_index: u32,
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
}
