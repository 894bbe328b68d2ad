use crate::models::{ImageRecord, JustifiedImage, LayoutRow};

/// Justified row packing.
///
/// Rows are filled left-to-right at a nominal height, then every row except
/// the last is rescaled so its width matches the container exactly.
#[derive(Debug, Clone)]
pub struct JustifiedLayout {
    /// Nominal row height in pixels used for placement (default: 90)
    pub target_height: u32,
}

impl Default for JustifiedLayout {
    fn default() -> Self {
        Self { target_height: 90 }
    }
}

impl JustifiedLayout {
    pub fn new(target_height: u32) -> Self {
        Self {
            target_height: target_height.max(1),
        }
    }

    fn nominal_width(&self, ratio: f64) -> f64 {
        self.target_height as f64 / ratio
    }

    /// Computes the justified rows for an ordered image sequence.
    ///
    /// # Algorithm
    /// 1. Place images greedily at the target height while the running row
    ///    width stays within `container_width`. An image wider than the
    ///    container on its own still gets a row to itself.
    /// 2. For every row but the last, set `height = round(W / Σ(1/ratio))`.
    ///    The last row keeps the target height.
    /// 3. Set each `width = round(height / ratio)`; in justified rows the last
    ///    image absorbs the rounding error so the row sums to `W` exactly.
    ///
    /// Pure: the records are only read.
    pub fn compute<'a, I>(&self, images: I, container_width: u32) -> Vec<LayoutRow>
    where
        I: IntoIterator<Item = &'a ImageRecord>,
    {
        if container_width == 0 {
            return Vec::new();
        }

        let limit = container_width as f64;
        let mut placed: Vec<Vec<(&ImageRecord, f64)>> = Vec::new();
        let mut pending: Vec<(&ImageRecord, f64)> = Vec::new();
        let mut row_width = 0.0f64;

        for record in images {
            let ratio = record.aspect_ratio();
            let item_w = self.nominal_width(ratio);
            if !pending.is_empty() && row_width + item_w > limit {
                placed.push(std::mem::take(&mut pending));
                row_width = 0.0;
            }
            pending.push((record, ratio));
            row_width += item_w;
        }
        if !pending.is_empty() {
            placed.push(pending);
        }

        let row_count = placed.len();
        placed
            .into_iter()
            .enumerate()
            .map(|(row_idx, row)| {
                let last_row = row_idx + 1 == row_count;
                let height = if last_row {
                    self.target_height
                } else {
                    let inverse_sum: f64 = row.iter().map(|(_, ratio)| 1.0 / ratio).sum();
                    ((limit / inverse_sum).round() as u32).max(1)
                };

                let mut items: Vec<JustifiedImage> = row
                    .iter()
                    .map(|(record, ratio)| JustifiedImage {
                        id: record.id.clone(),
                        height,
                        width: ((height as f64 / ratio).round() as u32).max(1),
                        ratio: *ratio,
                    })
                    .collect();

                if !last_row {
                    absorb_rounding(&mut items, container_width);
                }
                LayoutRow::new(row_idx as u32, height, items)
            })
            .collect()
    }

    /// Calculates the total height of all rows.
    pub fn total_height(&self, rows: &[LayoutRow]) -> u32 {
        stacked_height(rows)
    }
}

/// Sum of row heights, saturating at `u32::MAX`.
///
/// A sliver image can justify a row to `u32::MAX` on its own.
pub fn stacked_height(rows: &[LayoutRow]) -> u32 {
    rows.iter()
        .fold(0u32, |acc, row| acc.saturating_add(row.height_px))
}

/// Gives the row's rounding error to its last image so the widths sum to `target`.
fn absorb_rounding(items: &mut [JustifiedImage], target: u32) {
    let sum: i64 = items.iter().map(|i| i.width as i64).sum();
    let error = target as i64 - sum;
    if error == 0 {
        return;
    }
    if let Some(last) = items.last_mut() {
        last.width = (last.width as i64 + error).max(1) as u32;
    }
}
